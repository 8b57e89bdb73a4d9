//! Evaluation metrics for a finished placement.
//!
//! These are reporting helpers: they never influence a search, except that
//! HAGA evaporates pheromone by [`mean_task_completion_time`].
//!
//! Non-finite timings (unreachable network paths, zero-core allocations) are
//! left out of means and sums.

use serde::Serialize;

use crate::deploy::{acceptable, simulate_deploy};
use crate::fitness::{service_outcomes, task_completion_times};
use crate::model::{Application, Cloud, Solution};

/// Share of capacity left unused, per resource, over all clouds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IdleRate {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
}

/// `Σ max(0, allocatable) / Σ capacity` for cores, memory and storage after
/// deploying `genes`. A resource without capacity reports 0.
pub fn idle_rate(clouds: &[Cloud], apps: &[Application], genes: &[usize]) -> IdleRate {
    let deployed = simulate_deploy(clouds, apps, genes);
    let ratio = |left: fn(&Cloud) -> f64, cap: fn(&Cloud) -> f64| {
        let total: f64 = deployed.iter().map(cap).sum();
        if total > 0.0 {
            deployed.iter().map(|c| left(c).max(0.0)).sum::<f64>() / total
        } else {
            0.0
        }
    };
    IdleRate {
        cpu: ratio(
            |c| c.allocatable.cpu.logical_cores,
            |c| c.capacity.cpu.logical_cores,
        ),
        memory: ratio(|c| c.allocatable.memory, |c| c.capacity.memory),
        storage: ratio(|c| c.allocatable.storage, |c| c.capacity.storage),
    }
}

/// Priority-weighted share of accepted applications. 1.0 for an empty batch.
pub fn priority_acceptance_rate(apps: &[Application], genes: &[usize], num_clouds: usize) -> f64 {
    let total: u64 = apps.iter().map(|a| u64::from(a.priority)).sum();
    if total == 0 {
        return 1.0;
    }
    let accepted: u64 = apps
        .iter()
        .zip(genes)
        .filter(|&(_, &g)| g < num_clouds)
        .map(|(a, _)| u64::from(a.priority))
        .sum();
    accepted as f64 / total as f64
}

/// Share of accepted applications. 1.0 for an empty batch.
pub fn acceptance_rate(genes: &[usize], num_clouds: usize) -> f64 {
    if genes.is_empty() {
        return 1.0;
    }
    genes.iter().filter(|&&g| g < num_clouds).count() as f64 / genes.len() as f64
}

/// Mean completion time of the accepted tasks in `scope`; `None` when there
/// is no such task.
pub fn mean_task_completion_time(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: Option<&[bool]>,
) -> Option<f64> {
    let done: Vec<f64> = task_completion_times(clouds, apps, genes, scope)
        .into_iter()
        .filter_map(|(_, t)| t)
        .filter(|t| t.is_finite())
        .collect();
    (!done.is_empty()).then(|| done.iter().sum::<f64>() / done.len() as f64)
}

/// Sum of the repair times of the accepted services.
pub fn total_service_repair_time(clouds: &[Cloud], apps: &[Application], genes: &[usize]) -> f64 {
    service_outcomes(clouds, apps, genes)
        .iter()
        .filter_map(|o| o.repair_time)
        .sum()
}

/// Every metric of one solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub acceptable: bool,
    pub idle_rate: IdleRate,
    pub priority_acceptance_rate: f64,
    pub acceptance_rate: f64,
    pub mean_task_completion_time: Option<f64>,
    pub total_service_repair_time: f64,
}

impl Evaluation {
    pub fn of(clouds: &[Cloud], apps: &[Application], solution: &Solution) -> Self {
        let genes = solution.as_ref();
        let n = clouds.len();
        Self {
            acceptable: acceptable(clouds, apps, genes),
            idle_rate: idle_rate(clouds, apps, genes),
            priority_acceptance_rate: priority_acceptance_rate(apps, genes, n),
            acceptance_rate: acceptance_rate(genes, n),
            mean_task_completion_time: mean_task_completion_time(clouds, apps, genes, None),
            total_service_repair_time: total_service_repair_time(clouds, apps, genes),
        }
    }
}
