//! Greedy baseline schedulers.
//!
//! Both place one application at a time on a working snapshot of the clouds
//! that already holds every remaining application and every application
//! placed so far. New applications that a remaining application depends on
//! (directly or transitively) are visited first, since the remaining one
//! cannot be rejected if they are:
//!
//! - a migration-locked application keeps its cloud;
//! - any other application takes the first cloud (in trial order) that
//!   passes [`cloud_meet_app`] on the snapshot and keeps the partial
//!   placement acceptable;
//! - when no cloud qualifies, a new application is rejected and a remaining
//!   one keeps its previous cloud.
//!
//! A final pass rejects new applications whose dependencies ended up
//! rejected.

use rand::Rng;
use tracing::debug;

use crate::deploy::{acceptable_scoped, cloud_meet_app, simulate_deploy_scoped};
use crate::error::Result;
use crate::ga::operators::{default_genes, reject_orphans};
use crate::model::{validate_inputs, Application, Chromosome, Cloud, Solution};
use crate::random::{rng_from, shuffle};
use crate::scheduler::Scheduler;

/// Applications in input order (dependencies of remaining applications
/// first), clouds in index order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl Scheduler for FirstFit {
    fn name(&self) -> &'static str {
        "FirstFit"
    }

    fn schedule(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Solution> {
        validate_inputs(clouds, apps)?;
        let order: Vec<usize> = (0..apps.len()).collect();
        let trial: Vec<usize> = (0..clouds.len()).collect();
        let genes = greedy_fit(clouds, apps, &order, |_| trial.clone());
        debug!(accepted = accepted(&genes, clouds.len()), "first-fit: done");
        Ok(Solution::from(genes))
    }
}

/// Applications in random order, clouds in a fresh random order per
/// application.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomFit {
    /// Random seed for reproducibility. `None` uses a random seed.
    pub seed: Option<u64>,
}

impl RandomFit {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Scheduler for RandomFit {
    fn name(&self) -> &'static str {
        "RandomFit"
    }

    fn schedule(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Solution> {
        validate_inputs(clouds, apps)?;
        let mut rng = rng_from(self.seed);
        let mut order: Vec<usize> = (0..apps.len()).collect();
        shuffle(&mut order, &mut rng);
        let genes = greedy_fit(clouds, apps, &order, |_| random_order(clouds.len(), &mut rng));
        debug!(accepted = accepted(&genes, clouds.len()), "random-fit: done");
        Ok(Solution::from(genes))
    }
}

fn random_order<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    shuffle(&mut order, rng);
    order
}

fn accepted(genes: &[usize], num_clouds: usize) -> usize {
    genes.iter().filter(|&&g| g < num_clouds).count()
}

/// Stable reorder moving every rejectable application that a non-rejectable
/// one depends on, directly or transitively, to the front.
fn dependencies_first(apps: &[Application], order: &[usize]) -> Vec<usize> {
    let mut required = vec![false; apps.len()];
    let mut stack: Vec<usize> = (0..apps.len()).filter(|&i| !apps[i].can_reject()).collect();
    while let Some(i) = stack.pop() {
        for dep in &apps[i].depend {
            let j = dep.app_idx;
            if j < apps.len() && !required[j] {
                required[j] = true;
                stack.push(j);
            }
        }
    }

    let (mut front, back): (Vec<usize>, Vec<usize>) = order
        .iter()
        .partition(|&&i| required[i] && apps[i].can_reject());
    front.extend(back);
    front
}

/// Places applications in `order`, trying clouds in `trial(app)` order.
fn greedy_fit(
    clouds: &[Cloud],
    apps: &[Application],
    order: &[usize],
    mut trial: impl FnMut(usize) -> Vec<usize>,
) -> Chromosome {
    let reject = clouds.len();
    let mut genes = default_genes(apps, reject);
    // applications whose current gene occupies resources in the snapshot
    let mut placed: Vec<bool> = apps.iter().map(|a| !a.is_new).collect();

    for i in dependencies_first(apps, order) {
        let app = &apps[i];
        if app.is_locked() {
            continue;
        }

        placed[i] = false;
        let snapshot = simulate_deploy_scoped(clouds, apps, &genes, Some(&placed));
        placed[i] = true;

        let previous = genes[i];
        let chosen = trial(i).into_iter().find(|&c| {
            genes[i] = c;
            cloud_meet_app(&snapshot[c], app)
                && acceptable_scoped(clouds, apps, &genes, Some(&placed))
        });

        match chosen {
            Some(c) => genes[i] = c,
            None => {
                genes[i] = previous;
                placed[i] = !app.is_new;
            }
        }
    }

    let all_new: Vec<bool> = apps.iter().map(|a| a.is_new).collect();
    reject_orphans(&mut genes, apps, reject, &all_new);
    genes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::acceptable;
    use crate::model::{Cpu, Dependence, Requests, Resources, ServiceRequest};

    fn cloud(cores: f64, mem: f64) -> Cloud {
        Cloud::new("c", Resources::new(Cpu::new(cores, 2.0), mem, 1000.0, 5.0))
    }

    fn svc(priority: u32, cores: f64, mem: f64) -> Application {
        Application::service(
            "s",
            priority,
            ServiceRequest {
                requests: Requests::new(cores, mem, 1.0, 50.0),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_first_fit_scenario_a() {
        let clouds = vec![cloud(20.0, 1000.0), cloud(45.0, 1000.0)];
        let apps = vec![svc(5, 50.0, 10.0)];
        let solution = FirstFit.schedule(&clouds, &apps).unwrap();
        assert!(solution.is_rejected(0, 2));
    }

    #[test]
    fn test_first_fit_fills_in_order() {
        let clouds = vec![cloud(4.0, 100.0), cloud(8.0, 100.0)];
        let apps = vec![svc(5, 3.0, 10.0), svc(5, 3.0, 10.0), svc(5, 3.0, 10.0)];
        let solution = FirstFit.schedule(&clouds, &apps).unwrap();
        // the snapshot already counts the cores taken by earlier placements
        assert_eq!(solution.scheduling_result, vec![0, 1, 1]);
    }

    #[test]
    fn test_first_fit_keeps_locked_and_remaining() {
        let clouds = vec![cloud(4.0, 100.0), cloud(4.0, 100.0)];
        // cloud 1 starts overcommitted (115 of 100 memory)
        let apps = vec![
            svc(5, 1.0, 10.0).remaining_on(1, false),
            svc(5, 1.0, 95.0).remaining_on(1, true),
            svc(5, 1.0, 10.0).remaining_on(1, true),
        ];
        let solution = FirstFit.schedule(&clouds, &apps).unwrap();
        assert_eq!(solution.scheduling_result, vec![1, 0, 1]);
        assert!(acceptable(&clouds, &apps, &solution.scheduling_result));
    }

    #[test]
    fn test_first_fit_rejects_orphans() {
        let clouds = vec![cloud(4.0, 100.0)];
        let apps = vec![
            svc(1, 1.0, 10.0).with_depend(vec![Dependence::on(1)]),
            svc(9, 1.0, 500.0),
        ];
        let solution = FirstFit.schedule(&clouds, &apps).unwrap();
        assert_eq!(solution.scheduling_result, vec![1, 1]);
    }

    #[test]
    fn test_first_fit_places_dependency_of_remaining_app_first() {
        let clouds = vec![cloud(8.0, 100.0)];
        let apps = vec![
            svc(20, 1.0, 60.0),
            svc(10, 1.0, 60.0),
            svc(5, 1.0, 10.0)
                .with_depend(vec![Dependence::on(1)])
                .remaining_on(0, true),
        ];
        assert!(acceptable(&clouds, &apps, &[1, 0, 0]));

        let solution = FirstFit.schedule(&clouds, &apps).unwrap();
        assert_eq!(solution.scheduling_result, vec![1, 0, 0]);
        assert!(acceptable(&clouds, &apps, &solution.scheduling_result));

        let solution = RandomFit::new(Some(3)).schedule(&clouds, &apps).unwrap();
        assert!(acceptable(&clouds, &apps, &solution.scheduling_result));
    }

    #[test]
    fn test_dependencies_first_is_stable() {
        let apps = vec![
            svc(1, 1.0, 1.0),
            svc(1, 1.0, 1.0),
            svc(1, 1.0, 1.0).with_depend(vec![Dependence::on(3)]),
            svc(1, 1.0, 1.0),
            svc(1, 1.0, 1.0)
                .with_depend(vec![Dependence::on(2)])
                .remaining_on(0, true),
        ];
        assert_eq!(dependencies_first(&apps, &[0, 1, 2, 3, 4]), vec![2, 3, 0, 1, 4]);
        assert_eq!(dependencies_first(&apps, &[4, 3, 1, 2, 0]), vec![3, 2, 4, 1, 0]);
    }

    #[test]
    fn test_random_fit_is_acceptable_and_seeded() {
        let clouds = vec![cloud(8.0, 100.0), cloud(8.0, 100.0), cloud(8.0, 100.0)];
        let apps: Vec<Application> = (1..=10).map(|p| svc(p, 2.0, 30.0)).collect();
        let a = RandomFit::new(Some(5)).schedule(&clouds, &apps).unwrap();
        let b = RandomFit::default().with_seed(5).schedule(&clouds, &apps).unwrap();
        assert_eq!(a, b);
        assert!(acceptable(&clouds, &apps, &a.scheduling_result));
        // 3 per cloud fit by memory, 4 per cloud by cores
        assert_eq!(accepted(&a.scheduling_result, 3), 9);
    }
}
