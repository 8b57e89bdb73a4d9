//! HAGA configuration.

use crate::ga::{check_probability, GaConfig};

/// Configuration for the hybrid ant-colony/genetic scheduler.
///
/// The embedded [`GaConfig`] drives the inner search run for every group
/// (population size, iteration budget, selection, crossover, seed). Its
/// per-gene `mutation_rate` is unused: HAGA mutates by swapping genes inside
/// a sliding window.
///
/// ```
/// use u_cloudsched::haga::HagaConfig;
///
/// let config = HagaConfig::default()
///     .with_group_size(8)
///     .with_vm_gamma(0.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HagaConfig {
    pub ga: GaConfig,

    /// Target number of applications per group. Dependency components are
    /// never split, so a group may exceed it.
    pub group_size: usize,

    /// Fraction of clouds (lowest pheromone first) offered to every group
    /// after the first.
    pub vm_gamma: f64,

    /// Pheromone deposited per second of task execution.
    pub deposit_rate: f64,

    /// Width of the swap-mutation window, in group positions.
    pub window_size: usize,

    /// Probability that a chromosome undergoes swap mutation.
    pub swap_rate: f64,

    /// Stop a group's search after this many iterations without a better
    /// acceptable chromosome. 0 disables early stopping.
    pub stop_no_update_iteration: usize,
}

impl Default for HagaConfig {
    fn default() -> Self {
        Self {
            ga: GaConfig::default()
                .with_population_size(50)
                .with_max_iterations(100)
                .with_random_fit_init_ratio(1.0),
            group_size: 10,
            vm_gamma: 0.8,
            deposit_rate: 1.0,
            window_size: 4,
            swap_rate: 0.5,
            stop_no_update_iteration: 30,
        }
    }
}

impl HagaConfig {
    /// Replaces the inner GA parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    pub fn with_group_size(mut self, n: usize) -> Self {
        self.group_size = n;
        self
    }

    /// Sets the offered cloud fraction.
    pub fn with_vm_gamma(mut self, gamma: f64) -> Self {
        self.vm_gamma = gamma.clamp(0.0, 1.0);
        self
    }

    pub fn with_deposit_rate(mut self, rate: f64) -> Self {
        self.deposit_rate = rate;
        self
    }

    pub fn with_window_size(mut self, n: usize) -> Self {
        self.window_size = n;
        self
    }

    /// Sets the swap-mutation probability.
    pub fn with_swap_rate(mut self, rate: f64) -> Self {
        self.swap_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_stop_no_update_iteration(mut self, n: usize) -> Self {
        self.stop_no_update_iteration = n;
        self
    }

    /// Number of clouds offered to a later group.
    pub fn offered_clouds(&self, num_clouds: usize) -> usize {
        ((num_clouds as f64 * self.vm_gamma).ceil() as usize).clamp(1, num_clouds.max(1))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.ga.validate()?;
        if self.group_size == 0 {
            return Err("group_size must be at least 1".into());
        }
        if self.vm_gamma.is_nan() || self.vm_gamma <= 0.0 || self.vm_gamma > 1.0 {
            return Err("vm_gamma must be in (0, 1]".into());
        }
        if self.deposit_rate < 0.0 || !self.deposit_rate.is_finite() {
            return Err("deposit_rate must be finite and non-negative".into());
        }
        if self.window_size < 2 {
            return Err("window_size must be at least 2".into());
        }
        check_probability("swap_rate", self.swap_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offered_clouds() {
        let config = HagaConfig::default().with_vm_gamma(0.5);
        assert_eq!(config.offered_clouds(5), 3);
        assert_eq!(config.offered_clouds(1), 1);
        let config = config.with_vm_gamma(0.01);
        assert_eq!(config.offered_clouds(10), 1);
    }

    #[test]
    fn test_validate() {
        assert!(HagaConfig::default().validate().is_ok());
        assert!(HagaConfig::default().with_group_size(0).validate().is_err());
        assert!(HagaConfig::default().with_vm_gamma(0.0).validate().is_err());
        assert!(HagaConfig::default().with_window_size(1).validate().is_err());
        assert!(HagaConfig::default().with_deposit_rate(-1.0).validate().is_err());

        let config = HagaConfig {
            swap_rate: 2.0,
            ..HagaConfig::default()
        };
        assert!(config.validate().is_err());
        let config = HagaConfig {
            swap_rate: f64::NAN,
            ..HagaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
