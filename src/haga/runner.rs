//! Grouped hybrid ant-colony/genetic scheduler.

use rand::Rng;
use tracing::{debug, info, warn};

use super::config::HagaConfig;
use super::grouping::partition_groups;
use super::pheromone::Pheromone;
use crate::deploy::{acceptable_scoped, deploy_with_timeline};
use crate::error::{Result, SchedError};
use crate::fitness::{
    haga_reward, reject_threshold, task_completion_times, MAX_MULTIPLIER, TRIMMED_MEAN_MULTIPLIER,
};
use crate::ga::operators::{
    crossover_population, default_genes, fix_dependence, initial_population,
    random_fit_individual, GeneSpace, SlidingWindow,
};
use crate::ga::{evaluate_population, Direction, SearchState, SearchTrace};
use crate::metrics::mean_task_completion_time;
use crate::model::{validate_inputs, Application, Chromosome, Cloud, Solution};
use crate::random::rng_from;
use crate::scheduler::Scheduler;

/// Hybrid ant-colony/genetic scheduler (HAGA).
///
/// Applications are split into dependency-closed groups
/// ([`partition_groups`]) that are scheduled one after another on top of the
/// partial schedule built so far:
///
/// 1. pheromone on every cloud evaporates by the mean task completion time
///    of the partial schedule;
/// 2. the first group may use every cloud; later groups only the
///    `ceil(num_clouds × vm_gamma)` clouds with the least pheromone;
/// 3. an inner genetic search (random-fit initialization, selection,
///    crossover, sliding-window swap mutation, repair) maximizes the task
///    reward [`haga_reward`] against a rejection threshold derived from the
///    group's initial population;
/// 4. the best acceptable result is merged, and pheromone is deposited on
///    the clouds running the group's tasks in proportion to their execution
///    time.
///
/// Remaining applications keep their previous cloud in the partial schedule
/// until their own group is searched.
#[derive(Debug, Clone)]
pub struct Haga {
    config: HagaConfig,
    groups: Vec<Vec<usize>>,
    group_traces: Vec<SearchTrace>,
    group_clouds: Vec<Vec<usize>>,
    group_pheromone: Vec<Pheromone>,
    pheromone: Pheromone,
}

impl Haga {
    pub fn new(config: HagaConfig) -> Self {
        Self {
            config,
            groups: Vec::new(),
            group_traces: Vec::new(),
            group_clouds: Vec::new(),
            group_pheromone: Vec::new(),
            pheromone: Pheromone::new(0),
        }
    }

    pub fn config(&self) -> &HagaConfig {
        &self.config
    }

    /// Groups of the last run, in scheduling order.
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// One trace per group searched in the last run (fitness is the task
    /// reward).
    pub fn group_traces(&self) -> &[SearchTrace] {
        &self.group_traces
    }

    /// Clouds offered to each group of the last run.
    pub fn group_clouds(&self) -> &[Vec<usize>] {
        &self.group_clouds
    }

    /// Pheromone each group's offer was drawn from (after evaporation).
    pub fn group_pheromone(&self) -> &[Pheromone] {
        &self.group_pheromone
    }

    /// Pheromone table at the end of the last run.
    pub fn pheromone(&self) -> &Pheromone {
        &self.pheromone
    }

    fn run(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Chromosome> {
        self.config.validate().map_err(SchedError::InvalidConfig)?;
        validate_inputs(clouds, apps)?;
        let config = self.config.clone();

        let num_clouds = clouds.len();
        let all_clouds: Vec<usize> = (0..num_clouds).collect();
        let mut rng = rng_from(config.ga.seed);

        self.groups = partition_groups(apps, config.group_size);
        self.group_traces.clear();
        self.group_clouds.clear();
        self.group_pheromone.clear();
        self.pheromone = Pheromone::new(num_clouds);

        let mut solution = default_genes(apps, num_clouds);
        // remaining applications occupy their previous cloud from the start
        let mut scheduled: Vec<bool> = apps.iter().map(|a| !a.is_new).collect();

        for (g, group) in self.groups.clone().into_iter().enumerate() {
            let mean = mean_task_completion_time(clouds, apps, &solution, Some(&scheduled));
            if let Some(mean) = mean {
                self.pheromone.evaporate(mean);
            }
            let allowed = if g == 0 {
                all_clouds.clone()
            } else {
                self.pheromone.preferred(config.offered_clouds(num_clouds))
            };

            let mut scope = scheduled.clone();
            for &i in &group {
                scope[i] = true;
            }
            let space = GeneSpace::restricted(clouds, apps, group.clone(), &allowed);
            let offered = allowed.len();
            self.group_pheromone.push(self.pheromone.clone());
            self.group_clouds.push(allowed);

            let (best, trace) =
                search_group(&config, clouds, apps, &space, &solution, &scope, &mut rng);
            self.group_traces.push(trace);
            let Some(best) = best else {
                warn!(group = g, size = group.len(), "haga: no acceptable placement for group");
                return Err(SchedError::NoAcceptableSolution {
                    strategy: "HAGA",
                    group: Some(g),
                });
            };

            solution = best;
            scheduled = scope;

            let deposit = task_execution_per_cloud(clouds, apps, &solution, &scheduled, &group);
            self.pheromone.deposit(&deposit, config.deposit_rate);
            debug!(
                group = g,
                size = group.len(),
                offered,
                pheromone = ?self.pheromone.values(),
                "haga: group scheduled"
            );
        }

        Ok(solution)
    }
}

impl Scheduler for Haga {
    fn name(&self) -> &'static str {
        "HAGA"
    }

    fn schedule(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Solution> {
        info!(
            clouds = clouds.len(),
            apps = apps.len(),
            group_size = self.config.group_size,
            "haga: start"
        );
        let genes = self.run(clouds, apps)?;
        info!(groups = self.groups.len(), "haga: done");
        Ok(Solution::from(genes))
    }
}

/// Inner genetic search over one group. Returns the best acceptable
/// chromosome (full length, genes outside the group copied from `base`).
fn search_group<R: Rng>(
    config: &HagaConfig,
    clouds: &[Cloud],
    apps: &[Application],
    space: &GeneSpace,
    base: &[usize],
    scope: &[bool],
    rng: &mut R,
) -> (Option<Chromosome>, SearchTrace) {
    let ga = &config.ga;
    let scope = Some(scope);

    let mut population = initial_population(
        space,
        clouds,
        apps,
        base,
        scope,
        ga.population_size,
        ga.random_fit_init_ratio,
        rng,
    );

    let samples: Vec<f64> = population
        .iter()
        .flat_map(|genes| task_completion_times(clouds, apps, genes, scope))
        .filter_map(|(_, done)| done)
        .collect();
    let reject_exec_time = reject_threshold(&samples, TRIMMED_MEAN_MULTIPLIER, MAX_MULTIPLIER);

    let evaluate = |population: &[Chromosome]| {
        evaluate_population(population, ga.parallel, |genes| {
            (
                haga_reward(clouds, apps, genes, scope, reject_exec_time),
                acceptable_scoped(clouds, apps, genes, scope),
            )
        })
    };

    let mut window = SlidingWindow::new(config.window_size);
    let mut state = SearchState::new(Direction::Maximize);

    for iteration in 0..=ga.max_iterations {
        if iteration > 0 {
            crossover_population(&mut population, space, ga.crossover, ga.crossover_rate, rng);
            for genes in &mut population {
                if rng.random_bool(config.swap_rate) {
                    window.swap_mutation(genes, space, rng);
                }
                fix_dependence(genes, apps, space, rng);
                if !acceptable_scoped(clouds, apps, genes, scope) {
                    *genes = random_fit_individual(space, clouds, apps, base, scope, rng);
                }
            }
            window.advance(space.active().len());
        }

        let (fitness, ok) = evaluate(&population);
        state.observe(iteration, &population, &fitness, &ok);

        let patience = config.stop_no_update_iteration;
        if patience > 0 && state.no_update() >= patience {
            break;
        }
        population = ga.selection.select_population(&population, &fitness, &ok, rng);
    }

    let (best, trace) = state.finish();
    (best.map(|b| b.genes), trace)
}

/// Per-cloud sum of execution time (completion minus the moment the task
/// got the cloud's queue) over the group's accepted tasks.
fn task_execution_per_cloud(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: &[bool],
    group: &[usize],
) -> Vec<f64> {
    let (deployed, timings) = deploy_with_timeline(clouds, apps, genes, Some(scope));
    let mut in_group = vec![false; apps.len()];
    for &i in group {
        in_group[i] = true;
    }

    let mut amounts = vec![0.0; clouds.len()];
    for (c, cloud) in deployed.iter().enumerate() {
        // tasks share one FIFO queue per cloud
        let mut queue_free = 0.0f64;
        for &i in &cloud.running_apps {
            if !apps.get(i).is_some_and(Application::is_task) {
                continue;
            }
            let t = &timings[i];
            let exec = t.task_completion_time - t.data_input_done_time.max(queue_free);
            queue_free = t.task_completion_time;
            if in_group[i] && exec.is_finite() {
                amounts[c] += exec;
            }
        }
    }
    amounts
}
