//! Fitness and objective functions.
//!
//! Every function first deploys the chromosome with the simulator, then
//! reduces per-application contributions:
//!
//! - [`genetic_fitness`]: priority-weighted resource satisfaction (maximize)
//! - [`service_outcomes`] + [`nsga2_objectives`]: service repair time and
//!   dependency latency overhead (minimize both)
//! - [`haga_reward`]: task completion reward below a rejection threshold
//!   (maximize)
//!
//! Rejection thresholds come from the empirical distribution of the initial
//! population through [`reject_threshold`]. The constants below are part of
//! the scoring contract and are not meant to be tuned.

use crate::deploy::{deploy_with_timeline, simulate_deploy};
use crate::model::{AppTiming, Application, Cloud};

/// Fraction of the largest samples dropped before taking the trimmed mean.
pub const TRIM_CUT_RATE: f64 = 0.1;
/// Multiplier applied to the trimmed mean.
pub const TRIMMED_MEAN_MULTIPLIER: f64 = 4.0;
/// Multiplier applied to the maximum sample (time-like objectives).
pub const MAX_MULTIPLIER: f64 = 1.5;
/// Multiplier applied to the maximum sample (latency overhead).
pub const LATENCY_MAX_MULTIPLIER: f64 = 2.0;
/// Threshold used when no finite positive sample exists.
pub const FALLBACK_REJECT_THRESHOLD: f64 = 1.0;

/// Weights of the four sub-scores of [`genetic_fitness`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessWeights {
    pub cpu: f64,
    pub memory: f64,
    pub storage: f64,
    pub net_latency: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            cpu: 0.25,
            memory: 0.25,
            storage: 0.25,
            net_latency: 0.25,
        }
    }
}

impl FitnessWeights {
    /// Validates that weights are non-negative and not all zero.
    pub fn validate(&self) -> Result<(), String> {
        let w = [self.cpu, self.memory, self.storage, self.net_latency];
        if w.iter().any(|&x| x < 0.0 || !x.is_finite()) {
            return Err("fitness weights must be finite and non-negative".into());
        }
        if w.iter().sum::<f64>() <= 0.0 {
            return Err("fitness weights must not all be zero".into());
        }
        Ok(())
    }
}

/// Score of one application on its deployed cloud, before priority scaling.
///
/// CPU degrades smoothly with oversubscription (`cap / (deficit + cap)`),
/// memory and storage drop to 0 when overcommitted, latency degrades as
/// `requested / actual`. In strict mode an overcommitted memory or storage
/// zeroes the whole score.
pub fn app_score(cloud: &Cloud, app: &Application, weights: &FitnessWeights, strict: bool) -> f64 {
    let alloc = &cloud.allocatable;
    let cap = &cloud.capacity;
    let req = app.requests();

    let mem_ok = alloc.memory >= 0.0;
    let sto_ok = alloc.storage >= 0.0;
    if strict && !(mem_ok && sto_ok) {
        return 0.0;
    }

    let cpu = if alloc.cpu.logical_cores >= 0.0 {
        1.0
    } else {
        let capacity = cap.cpu.logical_cores;
        let deficit = -alloc.cpu.logical_cores;
        if capacity > 0.0 {
            capacity / (deficit + capacity)
        } else {
            0.0
        }
    };
    let mem = if mem_ok { 1.0 } else { 0.0 };
    let sto = if sto_ok { 1.0 } else { 0.0 };
    let lat = if alloc.net_latency <= req.net_latency {
        1.0
    } else if alloc.net_latency > 0.0 {
        (req.net_latency / alloc.net_latency).max(0.0)
    } else {
        0.0
    };

    weights.cpu * cpu + weights.memory * mem + weights.storage * sto + weights.net_latency * lat
}

/// Scalar fitness of a chromosome for the single-objective GA (maximize).
///
/// Sum over accepted applications of `priority × app_score`. Rejected
/// applications contribute nothing.
pub fn genetic_fitness(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    weights: &FitnessWeights,
    strict: bool,
) -> f64 {
    let deployed = simulate_deploy(clouds, apps, genes);
    apps.iter()
        .zip(genes)
        .filter(|&(_, &gene)| gene < deployed.len())
        .map(|(app, &gene)| app.priority as f64 * app_score(&deployed[gene], app, weights, strict))
        .sum()
}

/// Raw objective values of one service; `None` means the value is clamped
/// to the run's ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceOutcome {
    pub app: usize,
    pub repair_time: Option<f64>,
    pub latency_overhead: Option<f64>,
}

/// Evaluates every service of a chromosome.
///
/// Repair time is the stabilization latency minus the data-input phase:
/// `(stable − start) − (data_input_done − image_pull_done)`. Latency
/// overhead is the sum of RTTs from the service's cloud to each dependency's
/// cloud. A rejected service, or one on a cloud whose memory or storage went
/// negative, has neither value; a service with a rejected dependency has no
/// latency value.
pub fn service_outcomes(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
) -> Vec<ServiceOutcome> {
    let reject = clouds.len();
    let (deployed, timings) = deploy_with_timeline(clouds, apps, genes, None);

    apps.iter()
        .enumerate()
        .filter(|(_, app)| !app.is_task())
        .map(|(i, app)| {
            let gene = genes[i];
            if gene >= reject || deployed[gene].allocatable.overcommitted() {
                return ServiceOutcome {
                    app: i,
                    repair_time: None,
                    latency_overhead: None,
                };
            }
            let repair = repair_time(&timings[i]);
            let latency = app
                .depend
                .iter()
                .try_fold(0.0, |acc, dep| match genes.get(dep.app_idx) {
                    Some(&g) if g < reject => Some(acc + clouds[gene].rtt_to(g)),
                    _ => None,
                });
            ServiceOutcome {
                app: i,
                repair_time: repair.is_finite().then_some(repair),
                latency_overhead: latency.filter(|l| l.is_finite()),
            }
        })
        .collect()
}

fn repair_time(t: &AppTiming) -> f64 {
    (t.stable_time - t.start_time) - (t.data_input_done_time - t.image_pull_done_time)
}

/// Per-run ceilings for the two NSGA-II objectives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RejectCeilings {
    pub repair_time: f64,
    pub latency_overhead: f64,
}

impl RejectCeilings {
    /// Derives both ceilings from the outcomes of an initial population.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ServiceOutcome>) -> Self {
        let mut repairs = Vec::new();
        let mut latencies = Vec::new();
        for o in outcomes {
            repairs.extend(o.repair_time);
            latencies.extend(o.latency_overhead);
        }
        Self {
            repair_time: reject_threshold(&repairs, TRIMMED_MEAN_MULTIPLIER, MAX_MULTIPLIER),
            latency_overhead: reject_threshold(
                &latencies,
                TRIMMED_MEAN_MULTIPLIER,
                LATENCY_MAX_MULTIPLIER,
            ),
        }
    }
}

/// Sums service outcomes into `[repair_time, latency_overhead]`, clamping
/// missing or worse-than-ceiling values to the ceilings.
pub fn nsga2_objectives(outcomes: &[ServiceOutcome], ceilings: &RejectCeilings) -> [f64; 2] {
    outcomes.iter().fold([0.0, 0.0], |[r, l], o| {
        let repair = o
            .repair_time
            .map_or(ceilings.repair_time, |v| v.min(ceilings.repair_time));
        let latency = o
            .latency_overhead
            .map_or(ceilings.latency_overhead, |v| v.min(ceilings.latency_overhead));
        [r + repair, l + latency]
    })
}

/// Completion times of the tasks in `scope` (`None` for rejected tasks).
pub fn task_completion_times(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: Option<&[bool]>,
) -> Vec<(usize, Option<f64>)> {
    let reject = clouds.len();
    let (_, timings) = deploy_with_timeline(clouds, apps, genes, scope);
    apps.iter()
        .enumerate()
        .filter(|(i, app)| app.is_task() && scope.is_none_or(|s| s[*i]))
        .map(|(i, _)| {
            let done = (genes[i] < reject).then_some(timings[i].task_completion_time);
            (i, done)
        })
        .collect()
}

/// HAGA reward: `Σ max(0, reject_exec_time − completion)` over accepted
/// tasks in scope. Services and rejected tasks contribute 0.
pub fn haga_reward(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: Option<&[bool]>,
    reject_exec_time: f64,
) -> f64 {
    task_completion_times(clouds, apps, genes, scope)
        .into_iter()
        .filter_map(|(_, done)| done)
        .map(|done| (reject_exec_time - done).max(0.0))
        .sum()
}

/// Rejection threshold from an empirical distribution.
///
/// `max(trimmed_mean × trimmed_mult, max × max_mult)`, where the trimmed
/// mean drops the largest `ceil(n × TRIM_CUT_RATE)` samples (at least one
/// sample is kept). Non-finite samples are ignored. Returns
/// [`FALLBACK_REJECT_THRESHOLD`] when nothing positive remains.
pub fn reject_threshold(samples: &[f64], trimmed_mult: f64, max_mult: f64) -> f64 {
    let mut values: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return FALLBACK_REJECT_THRESHOLD;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let cut = (n as f64 * TRIM_CUT_RATE).ceil() as usize;
    let keep = n.saturating_sub(cut).max(1);
    let trimmed_mean = values[..keep].iter().sum::<f64>() / keep as f64;
    let max = values[n - 1];

    let threshold = (trimmed_mean * trimmed_mult).max(max * max_mult);
    if threshold > 0.0 {
        threshold
    } else {
        FALLBACK_REJECT_THRESHOLD
    }
}
