//! Multi-objective (NSGA-II) scheduler.

use tracing::{debug, info};

use super::config::Nsga2Config;
use super::multi_objective::{non_dominated_sort, select_survivors};
use crate::deploy::acceptable;
use crate::error::{Result, SchedError};
use crate::fitness::{nsga2_objectives, service_outcomes, RejectCeilings, ServiceOutcome};
use crate::ga::operators::{
    crossover_population, default_genes, fix_dependence, initial_population, mutate, GeneSpace,
};
use crate::ga::{evaluate_population, tournament, Direction, SearchState, SearchTrace};
use crate::model::{validate_inputs, Application, Cloud, Population, Solution};
use crate::random::rng_from;
use crate::scheduler::Scheduler;

/// NSGA-II scheduler minimizing total service repair time and total
/// dependency latency overhead.
///
/// Each iteration:
///
/// 1. parents are drawn by binary tournament on (Pareto rank, normalized
///    objective sum);
/// 2. offspring go through crossover, mutation and dependency repair;
/// 3. parents and offspring are merged and the next population is chosen by
///    acceptability, Pareto front and crowding distance.
///
/// Rejected or overcommitted services count at per-run ceilings derived
/// from the initial population. The returned chromosome is the acceptable
/// one with the lowest objective sum, each objective normalized by its
/// ceiling.
#[derive(Debug, Clone)]
pub struct Nsga2 {
    config: Nsga2Config,
    trace: SearchTrace,
    ceilings: Option<RejectCeilings>,
}

impl Nsga2 {
    pub fn new(config: Nsga2Config) -> Self {
        Self {
            config,
            trace: SearchTrace::default(),
            ceilings: None,
        }
    }

    pub fn config(&self) -> &Nsga2Config {
        &self.config
    }

    /// Trace of the last run; fitness is the normalized objective sum.
    pub fn trace(&self) -> &SearchTrace {
        &self.trace
    }

    /// Objective ceilings of the last run.
    pub fn ceilings(&self) -> Option<RejectCeilings> {
        self.ceilings
    }

    fn search(
        &self,
        clouds: &[Cloud],
        apps: &[Application],
    ) -> Result<(SearchState, RejectCeilings)> {
        self.config.validate().map_err(SchedError::InvalidConfig)?;
        validate_inputs(clouds, apps)?;
        let ga = &self.config.ga;
        let size = ga.population_size;

        let mut rng = rng_from(ga.seed);
        let space = GeneSpace::new(clouds, apps);
        let base = default_genes(apps, clouds.len());

        let mut population = initial_population(
            &space,
            clouds,
            apps,
            &base,
            None,
            size,
            ga.random_fit_init_ratio,
            &mut rng,
        );

        let (outcomes, mut ok): (Vec<Vec<ServiceOutcome>>, Vec<bool>) =
            evaluate_population(&population, ga.parallel, |genes| {
                (
                    service_outcomes(clouds, apps, genes),
                    acceptable(clouds, apps, genes),
                )
            });
        let ceilings = RejectCeilings::from_outcomes(outcomes.iter().flatten());
        debug!(
            repair_time = ceilings.repair_time,
            latency_overhead = ceilings.latency_overhead,
            "nsga2: reject ceilings"
        );
        let mut objectives: Vec<[f64; 2]> = outcomes
            .iter()
            .map(|o| nsga2_objectives(o, &ceilings))
            .collect();

        let scalar = |o: &[f64; 2]| o[0] / ceilings.repair_time + o[1] / ceilings.latency_overhead;
        let evaluate = |population: &Population| {
            evaluate_population(population, ga.parallel, |genes| {
                (
                    nsga2_objectives(&service_outcomes(clouds, apps, genes), &ceilings),
                    acceptable(clouds, apps, genes),
                )
            })
        };

        let mut state = SearchState::new(Direction::Minimize);
        let sums: Vec<f64> = objectives.iter().map(scalar).collect();
        state.observe(0, &population, &sums, &ok);

        for iteration in 1..=ga.max_iterations {
            let ranks = non_dominated_sort(&objectives, Some(&ok)).ranks;
            let sums: Vec<f64> = objectives.iter().map(scalar).collect();
            let better = |a: usize, b: usize| (ranks[a], sums[a]) < (ranks[b], sums[b]);

            let mut offspring: Population = (0..size)
                .map(|_| population[tournament(size, 2, &mut rng, better)].clone())
                .collect();
            crossover_population(
                &mut offspring,
                &space,
                ga.crossover,
                ga.crossover_rate,
                &mut rng,
            );
            for genes in &mut offspring {
                mutate(genes, &space, ga.mutation_rate, &mut rng);
                fix_dependence(genes, apps, &space, &mut rng);
            }
            let (off_objectives, off_ok) = evaluate(&offspring);

            population.extend(offspring);
            objectives.extend(off_objectives);
            ok.extend(off_ok);

            let merged_sums: Vec<f64> = objectives.iter().map(scalar).collect();
            if state.observe(iteration, &population, &merged_sums, &ok) {
                debug!(
                    iteration,
                    fitness = state.best_acceptable().map(|b| b.fitness),
                    "nsga2: best acceptable improved"
                );
            }

            let survivors = select_survivors(&objectives, Some(&ok), size);
            population = survivors.iter().map(|&i| population[i].clone()).collect();
            objectives = survivors.iter().map(|&i| objectives[i]).collect();
            ok = survivors.iter().map(|&i| ok[i]).collect();

            let patience = self.config.stop_no_update_iteration;
            if patience > 0 && state.no_update() >= patience {
                debug!(iteration, "nsga2: no improvement, stopping early");
                break;
            }
        }

        Ok((state, ceilings))
    }
}

impl Scheduler for Nsga2 {
    fn name(&self) -> &'static str {
        "NSGA-II"
    }

    fn schedule(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Solution> {
        info!(
            clouds = clouds.len(),
            apps = apps.len(),
            population = self.config.ga.population_size,
            iterations = self.config.ga.max_iterations,
            "nsga2: start"
        );
        let (state, ceilings) = self.search(clouds, apps)?;
        let (best, trace) = state.finish();
        self.trace = trace;
        self.ceilings = Some(ceilings);
        let best = best.ok_or(SchedError::NoAcceptableSolution {
            strategy: self.name(),
            group: None,
        })?;
        info!(fitness = best.fitness, "nsga2: done");
        Ok(Solution::from(best.genes))
    }
}
