//! Deployment simulation and hard feasibility.
//!
//! - [`cloud_meet_app`]: cheap local pre-filter (one app, one cloud)
//! - [`acceptable`]: the authoritative hard-constraint gate over a whole
//!   chromosome
//! - [`simulate_deploy`]: subtracts requests from an owned copy of the clouds
//! - [`truly_deploy`]: replays the per-cloud queues of a deployed snapshot to
//!   derive timing
//!
//! Every function borrows its inputs immutably and returns owned data, so
//! concurrent evaluations never share mutable state.
//!
//! The `_scoped` variants take an optional scope mask: applications outside
//! the scope are neither deployed nor checked. Grouped scheduling uses this
//! to evaluate a partial schedule.

use crate::model::{AppRequest, AppTiming, Application, Cloud};

/// Share of a cloud's cores always left to tasks, even when services
/// oversubscribe the CPU.
pub const MIN_TASK_CPU_SHARE: f64 = 0.1;

#[inline]
fn in_scope(scope: Option<&[bool]>, i: usize) -> bool {
    scope.is_none_or(|s| s.get(i).copied().unwrap_or(false))
}

/// Whether `cloud` can host `app` on its own.
///
/// Compares the cloud's allocatable cores, memory and storage with the
/// request, and requires the cloud's user latency not to exceed the
/// application's tolerance. Other pending placements are ignored.
pub fn cloud_meet_app(cloud: &Cloud, app: &Application) -> bool {
    let req = app.requests();
    let alloc = &cloud.allocatable;
    alloc.cpu.logical_cores >= req.cpu
        && alloc.memory >= req.memory
        && alloc.storage >= req.storage
        && alloc.net_latency <= req.net_latency
}

/// Hard feasibility of a full chromosome.
///
/// Returns `false` when the chromosome has the wrong length or an
/// out-of-range gene, a migration-locked application moved, a remaining
/// application was rejected, an accepted application depends on a rejected
/// one, or memory/storage of any cloud goes negative. CPU oversubscription
/// alone is allowed.
pub fn acceptable(clouds: &[Cloud], apps: &[Application], genes: &[usize]) -> bool {
    acceptable_scoped(clouds, apps, genes, None)
}

/// [`acceptable`] restricted to the applications in `scope`.
pub fn acceptable_scoped(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: Option<&[bool]>,
) -> bool {
    let reject = clouds.len();
    if genes.len() != apps.len() {
        return false;
    }

    let mut left: Vec<(f64, f64)> = clouds
        .iter()
        .map(|c| (c.allocatable.memory, c.allocatable.storage))
        .collect();

    for (i, app) in apps.iter().enumerate() {
        if !in_scope(scope, i) {
            continue;
        }
        let gene = genes[i];
        if gene > reject {
            return false;
        }
        if app.is_locked() && gene != app.cloud_remaining_on {
            return false;
        }
        if gene == reject {
            if !app.can_reject() {
                return false;
            }
            continue;
        }
        for dep in &app.depend {
            match genes.get(dep.app_idx) {
                None => return false,
                Some(&g) if g == reject && in_scope(scope, dep.app_idx) => return false,
                _ => {}
            }
        }
        let req = app.requests();
        left[gene].0 -= req.memory;
        left[gene].1 -= req.storage;
    }

    left.iter().all(|&(mem, sto)| mem >= 0.0 && sto >= 0.0)
}

/// Deploys a chromosome onto an owned copy of the clouds.
///
/// Each accepted application's request is subtracted from its cloud's
/// `allocatable`, and its index is appended to the cloud's `running_apps`
/// queue (which is rebuilt from scratch). `tmp_alloc` is reset to the
/// resulting allocatable view. Rejected applications are skipped.
pub fn simulate_deploy(clouds: &[Cloud], apps: &[Application], genes: &[usize]) -> Vec<Cloud> {
    simulate_deploy_scoped(clouds, apps, genes, None)
}

/// [`simulate_deploy`] restricted to the applications in `scope`.
pub fn simulate_deploy_scoped(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: Option<&[bool]>,
) -> Vec<Cloud> {
    let mut deployed = clouds.to_vec();
    for cloud in &mut deployed {
        cloud.running_apps.clear();
    }

    for (i, (app, &gene)) in apps.iter().zip(genes).enumerate() {
        if gene >= deployed.len() || !in_scope(scope, i) {
            continue;
        }
        let req = app.requests();
        let cloud = &mut deployed[gene];
        cloud.allocatable.cpu.logical_cores -= req.cpu;
        cloud.allocatable.memory -= req.memory;
        cloud.allocatable.storage -= req.storage;
        cloud.running_apps.push(i);
    }

    for cloud in &mut deployed {
        cloud.tmp_alloc = cloud.allocatable;
    }
    deployed
}

/// Replays the queues of a deployed snapshot and returns per-application
/// timing (indexed like `apps`; applications on no queue stay zero).
///
/// Per application on cloud `c`, in seconds from the scheduling instant:
///
/// 1. the image is pulled over `c.net_condition_image`;
/// 2. input data is fetched over `c.net_condition_controller`;
/// 3. a service computes `stable_work` on its requested cores, scaled down
///    proportionally when services oversubscribe the cloud;
/// 4. tasks on one cloud run one after another in queue order, each on at
///    most the cores services leave free (never less than
///    [`MIN_TASK_CPU_SHARE`] of the capacity).
///
/// Paths without bandwidth and zero-core allocations yield infinite times.
pub fn truly_deploy(deployed: &[Cloud], apps: &[Application]) -> Vec<AppTiming> {
    let mut timings = vec![AppTiming::default(); apps.len()];

    for cloud in deployed {
        let cap = cloud.capacity.cpu.logical_cores;
        let clock = cloud.capacity.cpu.base_clock;

        let service_cores: f64 = cloud
            .running_apps
            .iter()
            .filter_map(|&i| apps.get(i))
            .filter(|a| !a.is_task())
            .map(|a| a.requests().cpu)
            .sum();
        let service_scale = if service_cores > cap && service_cores > 0.0 {
            cap / service_cores
        } else {
            1.0
        };
        let task_cores = (cap - service_cores).max(cap * MIN_TASK_CPU_SHARE);

        let mut queue_free = 0.0f64;
        for &i in &cloud.running_apps {
            let Some(app) = apps.get(i) else { continue };
            let timing = &mut timings[i];
            timing.start_time = 0.0;
            timing.image_pull_done_time =
                timing.start_time + cloud.net_condition_image.transfer_time(app.image_size);
            timing.data_input_done_time = timing.image_pull_done_time
                + cloud
                    .net_condition_controller
                    .transfer_time(app.request.input_data_size());

            match &app.request {
                AppRequest::Service(s) => {
                    let cores = s.requests.cpu * service_scale;
                    timing.stable_time =
                        timing.data_input_done_time + work_time(s.stable_work, cores, clock);
                }
                AppRequest::Task(t) => {
                    let cores = t.requests.cpu.min(task_cores);
                    let exec_start = timing.data_input_done_time.max(queue_free);
                    timing.task_completion_time =
                        exec_start + work_time(t.task_work, cores, clock);
                    queue_free = timing.task_completion_time;
                }
            }
        }
    }

    timings
}

/// Seconds to execute `work` giga-cycles on `cores` cores at `clock` GHz.
fn work_time(work: f64, cores: f64, clock: f64) -> f64 {
    if work <= 0.0 {
        0.0
    } else if cores <= 0.0 || clock <= 0.0 {
        f64::INFINITY
    } else {
        work / (cores * clock)
    }
}

/// Deploys `genes` and replays the result in one step.
pub fn deploy_with_timeline(
    clouds: &[Cloud],
    apps: &[Application],
    genes: &[usize],
    scope: Option<&[bool]>,
) -> (Vec<Cloud>, Vec<AppTiming>) {
    let deployed = simulate_deploy_scoped(clouds, apps, genes, scope);
    let timings = truly_deploy(&deployed, apps);
    (deployed, timings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Cpu, Dependence, NetCondition, Requests, Resources, ServiceRequest, TaskRequest,
    };

    fn cloud(cpu: f64, mem: f64, sto: f64) -> Cloud {
        Cloud::new("c", Resources::new(Cpu::new(cpu, 2.0), mem, sto, 10.0))
    }

    fn svc(cpu: f64, mem: f64, sto: f64) -> Application {
        Application::service(
            "s",
            10,
            ServiceRequest {
                requests: Requests::new(cpu, mem, sto, 100.0),
                ..Default::default()
            },
        )
    }

    fn task(cpu: f64, work: f64) -> Application {
        Application::task(
            "t",
            10,
            TaskRequest {
                requests: Requests::new(cpu, 1.0, 1.0, 100.0),
                task_work: work,
                input_data_size: 0.0,
            },
        )
    }

    #[test]
    fn test_cloud_meet_app_scenario_a() {
        let clouds = [cloud(20.0, 10000.0, 10000.0), cloud(45.0, 10000.0, 10000.0)];
        let app = svc(50.0, 100.0, 100.0);
        assert!(!cloud_meet_app(&clouds[0], &app));
        assert!(!cloud_meet_app(&clouds[1], &app));
        assert!(cloud_meet_app(&clouds[1], &svc(45.0, 100.0, 100.0)));
    }

    #[test]
    fn test_cloud_meet_app_latency() {
        let mut app = svc(1.0, 1.0, 1.0);
        if let AppRequest::Service(s) = &mut app.request {
            s.requests.net_latency = 5.0;
        }
        assert!(!cloud_meet_app(&cloud(4.0, 10.0, 10.0), &app));
    }

    #[test]
    fn test_acceptable_cpu_is_compressible() {
        let clouds = [cloud(2.0, 100.0, 100.0)];
        let apps = [svc(4.0, 10.0, 10.0), svc(4.0, 10.0, 10.0)];
        assert!(acceptable(&clouds, &apps, &[0, 0]));
    }

    #[test]
    fn test_acceptable_memory_is_not() {
        let clouds = [cloud(8.0, 100.0, 100.0)];
        let apps = [svc(1.0, 60.0, 10.0), svc(1.0, 60.0, 10.0)];
        assert!(!acceptable(&clouds, &apps, &[0, 0]));
        assert!(acceptable(&clouds, &apps, &[0, 1]));
    }

    #[test]
    fn test_acceptable_locks() {
        let clouds = [cloud(8.0, 100.0, 100.0), cloud(8.0, 100.0, 100.0)];
        let locked = [svc(1.0, 1.0, 1.0).remaining_on(1, false)];
        assert!(acceptable(&clouds, &locked, &[1]));
        assert!(!acceptable(&clouds, &locked, &[0]));
        assert!(!acceptable(&clouds, &locked, &[2]));

        let movable = [svc(1.0, 1.0, 1.0).remaining_on(1, true)];
        assert!(acceptable(&clouds, &movable, &[0]));
        assert!(!acceptable(&clouds, &movable, &[2]));
    }

    #[test]
    fn test_acceptable_dependency_and_shape() {
        let clouds = [cloud(8.0, 100.0, 100.0)];
        let mut high = svc(1.0, 1.0, 1.0);
        high.priority = 20;
        let apps = [high, svc(1.0, 1.0, 1.0).with_depend(vec![Dependence::on(0)])];
        assert!(acceptable(&clouds, &apps, &[0, 0]));
        assert!(acceptable(&clouds, &apps, &[0, 1]));
        assert!(acceptable(&clouds, &apps, &[1, 1]));
        assert!(!acceptable(&clouds, &apps, &[1, 0]));
        assert!(!acceptable(&clouds, &apps, &[0]));
        assert!(!acceptable(&clouds, &apps, &[0, 7]));
    }

    #[test]
    fn test_acceptable_scoped_ignores_outside() {
        let clouds = [cloud(8.0, 100.0, 100.0)];
        let apps = [svc(1.0, 90.0, 1.0), svc(1.0, 90.0, 1.0).remaining_on(0, false)];
        assert!(!acceptable(&clouds, &apps, &[0, 0]));
        assert!(acceptable_scoped(&clouds, &apps, &[0, 1], Some(&[true, false])));
    }

    #[test]
    fn test_simulate_deploy_leaves_inputs_untouched() {
        let clouds = vec![cloud(8.0, 100.0, 100.0), cloud(8.0, 100.0, 100.0)];
        let apps = vec![svc(3.0, 40.0, 10.0), svc(2.0, 20.0, 5.0), svc(1.0, 1.0, 1.0)];
        let before = clouds.clone();
        let deployed = simulate_deploy(&clouds, &apps, &[1, 1, 2]);
        assert_eq!(clouds, before);
        assert_eq!(deployed[0].allocatable, clouds[0].allocatable);
        assert_eq!(deployed[1].allocatable.cpu.logical_cores, 3.0);
        assert_eq!(deployed[1].allocatable.memory, 40.0);
        assert_eq!(deployed[1].allocatable.storage, 85.0);
        assert_eq!(deployed[1].running_apps, vec![0, 1]);
        assert_eq!(deployed[1].tmp_alloc, deployed[1].allocatable);
    }

    #[test]
    fn test_truly_deploy_serializes_tasks() {
        let clouds = vec![cloud(4.0, 100.0, 100.0)];
        // 8 giga-cycles on 2 cores at 2 GHz = 2 s each
        let apps = vec![task(2.0, 8.0), task(2.0, 8.0)];
        let (_, timings) = deploy_with_timeline(&clouds, &apps, &[0, 0], None);
        assert!((timings[0].task_completion_time - 2.0).abs() < 1e-9);
        assert!((timings[1].task_completion_time - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_truly_deploy_services_reduce_task_cores() {
        let clouds = vec![cloud(4.0, 100.0, 100.0)];
        let apps = vec![svc(3.0, 1.0, 1.0), task(4.0, 8.0)];
        let (_, timings) = deploy_with_timeline(&clouds, &apps, &[0, 0], None);
        // one core left at 2 GHz
        assert!((timings[1].task_completion_time - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_truly_deploy_network_phases() {
        let c = cloud(4.0, 100.0, 100.0)
            .with_image_path(NetCondition::new(1000.0, 100.0))
            .with_controller_path(NetCondition::new(0.0, 50.0));
        let mut app = Application::service(
            "s",
            5,
            ServiceRequest {
                requests: Requests::new(1.0, 1.0, 1.0, 100.0),
                stable_work: 4.0,
                input_data_size: 100.0,
            },
        )
        .with_image_size(200.0);
        app.priority = 5;
        let (_, t) = deploy_with_timeline(&[c], &[app], &[0], None);
        assert!((t[0].image_pull_done_time - 3.0).abs() < 1e-9);
        assert!((t[0].data_input_done_time - 5.0).abs() < 1e-9);
        assert!((t[0].stable_time - 7.0).abs() < 1e-9);
    }
}
