//! NSGA-II configuration.

use crate::ga::GaConfig;

/// Configuration for the NSGA-II scheduler.
///
/// The embedded [`GaConfig`] supplies population size, iteration budget,
/// crossover, mutation and seed. Its `selection`, `weights` and
/// `strict_stage_ratio` are unused: parents are picked by binary tournament
/// on (Pareto rank, normalized objective sum).
///
/// ```
/// use u_cloudsched::nsga2::Nsga2Config;
///
/// let config = Nsga2Config::default().with_stop_no_update_iteration(20);
/// assert_eq!(config.stop_no_update_iteration, 20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Nsga2Config {
    pub ga: GaConfig,

    /// Stop after this many consecutive iterations without a better
    /// acceptable chromosome. 0 disables early stopping.
    pub stop_no_update_iteration: usize,
}

impl Default for Nsga2Config {
    fn default() -> Self {
        Self {
            ga: GaConfig::default()
                .with_mutation_rate(0.05)
                .with_random_fit_init_ratio(1.0),
            stop_no_update_iteration: 50,
        }
    }
}

impl Nsga2Config {
    /// Replaces the shared GA parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the early-stop patience.
    pub fn with_stop_no_update_iteration(mut self, n: usize) -> Self {
        self.stop_no_update_iteration = n;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.ga.validate()
    }
}
