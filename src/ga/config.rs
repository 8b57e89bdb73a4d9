//! GA configuration.
//!
//! [`GaConfig`] holds the parameters shared by every genetic search in the
//! crate: the plain genetic scheduler uses it directly, NSGA-II and HAGA
//! embed it.

use super::operators::Crossover;
use super::selection::Selection;
use crate::fitness::FitnessWeights;

/// Configuration for the genetic search.
///
/// # Defaults
///
/// ```
/// use u_cloudsched::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_iterations, 200);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_cloudsched::ga::{Crossover, GaConfig};
///
/// let config = GaConfig::default()
///     .with_population_size(60)
///     .with_crossover(Crossover::OnePoint)
///     .with_mutation_rate(0.05)
///     .with_seed(7);
/// ```
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// Number of chromosomes in the population.
    pub population_size: usize,

    /// Number of crossover/mutation/selection rounds after the initial
    /// selection.
    pub max_iterations: usize,

    /// Parent selection for scalar fitness.
    pub selection: Selection,

    /// Recombination operator.
    pub crossover: Crossover,

    /// Probability that a chromosome takes part in crossover (0.0–1.0).
    pub crossover_rate: f64,

    /// Per-gene probability of a random redraw (0.0–1.0).
    pub mutation_rate: f64,

    /// Fraction of the initial population built by randomized greedy
    /// construction; the rest is drawn uniformly from the candidate sets.
    pub random_fit_init_ratio: f64,

    /// Fraction of the iteration budget after which the strict fitness
    /// (memory/storage violations score 0) is used. 1.0 never switches.
    pub strict_stage_ratio: f64,

    /// Sub-score weights of the scalar fitness.
    pub weights: FitnessWeights,

    /// Whether to evaluate chromosomes in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_iterations: 200,
            selection: Selection::default(),
            crossover: Crossover::default(),
            crossover_rate: 0.7,
            mutation_rate: 0.02,
            random_fit_init_ratio: 0.5,
            strict_stage_ratio: 0.5,
            weights: FitnessWeights::default(),
            parallel: true,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of iterations.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-gene mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the share of greedy-constructed initial chromosomes.
    pub fn with_random_fit_init_ratio(mut self, ratio: f64) -> Self {
        self.random_fit_init_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets when strict fitness starts, as a fraction of the budget.
    pub fn with_strict_stage_ratio(mut self, ratio: f64) -> Self {
        self.strict_stage_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// First iteration scored with the strict fitness.
    pub fn strict_from_iteration(&self) -> usize {
        if self.strict_stage_ratio >= 1.0 {
            usize::MAX
        } else {
            (self.max_iterations as f64 * self.strict_stage_ratio).ceil() as usize
        }
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if let Selection::Tournament(k) = self.selection {
            if k == 0 {
                return Err("tournament size must be at least 1".into());
            }
        }
        check_probability("crossover_rate", self.crossover_rate)?;
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability("random_fit_init_ratio", self.random_fit_init_ratio)?;
        check_probability("strict_stage_ratio", self.strict_stage_ratio)?;
        self.weights.validate()
    }
}

/// Rejects a rate outside `[0, 1]`, NaN included.
pub(crate) fn check_probability(name: &str, value: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} must be in [0, 1], got {value}"))
    }
}
