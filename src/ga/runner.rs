//! Single-objective genetic scheduler.
//!
//! [`Genetic`] runs the loop
//! `init → evaluate/select (iteration 0) → {crossover → mutate → repair →
//! evaluate → select} × max_iterations` and returns the best acceptable
//! chromosome ever observed.

use rayon::prelude::*;
use tracing::{debug, info};

use super::config::GaConfig;
use super::operators::{
    crossover_population, default_genes, fix_dependence, initial_population, mutate, GeneSpace,
};
use super::state::{Direction, SearchState, SearchTrace};
use crate::deploy::acceptable;
use crate::error::{Result, SchedError};
use crate::fitness::genetic_fitness;
use crate::model::{validate_inputs, Application, Chromosome, Cloud, Solution};
use crate::random::rng_from;
use crate::scheduler::Scheduler;

/// Genetic scheduler maximizing [`genetic_fitness`].
///
/// # Usage
///
/// ```
/// use u_cloudsched::ga::{GaConfig, Genetic};
/// use u_cloudsched::model::{Application, Cloud, Cpu, Requests, Resources, ServiceRequest};
/// use u_cloudsched::Scheduler;
///
/// let clouds = vec![
///     Cloud::new("a", Resources::new(Cpu::new(8.0, 2.0), 1e9, 1e10, 5.0)),
///     Cloud::new("b", Resources::new(Cpu::new(4.0, 2.0), 1e9, 1e10, 5.0)),
/// ];
/// let apps = vec![Application::service(
///     "web",
///     10,
///     ServiceRequest { requests: Requests::new(2.0, 1e8, 1e9, 50.0), ..Default::default() },
/// )];
///
/// let config = GaConfig::default()
///     .with_population_size(20)
///     .with_max_iterations(10)
///     .with_parallel(false)
///     .with_seed(42);
/// let mut genetic = Genetic::new(config);
/// let solution = genetic.schedule(&clouds, &apps).unwrap();
/// assert!(solution.scheduling_result[0] < 2);
/// assert_eq!(genetic.trace().len(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct Genetic {
    config: GaConfig,
    trace: SearchTrace,
}

impl Genetic {
    pub fn new(config: GaConfig) -> Self {
        Self {
            config,
            trace: SearchTrace::default(),
        }
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Trace of the last run (empty before the first run).
    pub fn trace(&self) -> &SearchTrace {
        &self.trace
    }

    fn search(&self, clouds: &[Cloud], apps: &[Application]) -> Result<SearchState> {
        let config = &self.config;
        config.validate().map_err(SchedError::InvalidConfig)?;
        validate_inputs(clouds, apps)?;

        let mut rng = rng_from(config.seed);
        let space = GeneSpace::new(clouds, apps);
        let base = default_genes(apps, clouds.len());
        let strict_from = config.strict_from_iteration();

        let mut population = initial_population(
            &space,
            clouds,
            apps,
            &base,
            None,
            config.population_size,
            config.random_fit_init_ratio,
            &mut rng,
        );
        let mut state = SearchState::new(Direction::Maximize);

        for iteration in 0..=config.max_iterations {
            if iteration > 0 {
                crossover_population(
                    &mut population,
                    &space,
                    config.crossover,
                    config.crossover_rate,
                    &mut rng,
                );
                for genes in &mut population {
                    mutate(genes, &space, config.mutation_rate, &mut rng);
                    fix_dependence(genes, apps, &space, &mut rng);
                }
            }

            let strict = iteration >= strict_from;
            let (fitness, ok) = evaluate_population(&population, config.parallel, |genes| {
                (
                    genetic_fitness(clouds, apps, genes, &config.weights, strict),
                    acceptable(clouds, apps, genes),
                )
            });

            if state.observe(iteration, &population, &fitness, &ok) {
                debug!(
                    iteration,
                    fitness = state.best_acceptable().map(|b| b.fitness),
                    "genetic: best acceptable improved"
                );
            }

            population = config
                .selection
                .select_population(&population, &fitness, &ok, &mut rng);
        }

        Ok(state)
    }
}

impl Scheduler for Genetic {
    fn name(&self) -> &'static str {
        "Genetic"
    }

    fn schedule(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Solution> {
        info!(
            clouds = clouds.len(),
            apps = apps.len(),
            population = self.config.population_size,
            iterations = self.config.max_iterations,
            "genetic: start"
        );
        let (best, trace) = self.search(clouds, apps)?.finish();
        self.trace = trace;
        let best = best.ok_or(SchedError::NoAcceptableSolution {
            strategy: self.name(),
            group: None,
        })?;
        info!(fitness = best.fitness, "genetic: done");
        Ok(Solution::from(best.genes))
    }
}

/// Scores every chromosome, returning `(score, acceptable)` columns.
///
/// Uses the rayon pool when `parallel` is set; results keep population
/// order either way.
pub(crate) fn evaluate_population<T, F>(
    population: &[Chromosome],
    parallel: bool,
    score: F,
) -> (Vec<T>, Vec<bool>)
where
    T: Send,
    F: Fn(&Chromosome) -> (T, bool) + Sync,
{
    if parallel {
        population.par_iter().map(&score).unzip()
    } else {
        population.iter().map(score).unzip()
    }
}
