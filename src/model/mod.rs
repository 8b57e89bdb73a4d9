//! Resource and entity model.
//!
//! - [`Cloud`], [`Resources`], [`Cpu`], [`NetCondition`]: the cloud side
//! - [`Application`], [`AppRequest`], [`Dependence`], [`AppTiming`]: the workload side
//! - [`Solution`], [`Chromosome`], [`Population`]: placements
//!
//! [`validate_inputs`] checks the preconditions every scheduler relies on.

mod application;
mod resources;
mod solution;

pub use application::{
    apps_copy, AppRequest, AppTiming, Application, Dependence, Requests, ServiceRequest,
    TaskRequest,
};
pub use resources::{clouds_copy, Cloud, Cpu, NetCondition, Resources};
pub use solution::{Chromosome, Population, Solution};

use crate::error::{Result, SchedError};

/// Highest legal priority.
pub const MAX_PRIORITY: u32 = 65535;

/// Checks that every dependency edge points at an existing application with
/// strictly higher priority than the dependent.
pub fn validate_dependencies(apps: &[Application]) -> Result<()> {
    for (i, app) in apps.iter().enumerate() {
        for dep in &app.depend {
            let Some(target) = apps.get(dep.app_idx) else {
                return Err(SchedError::DependencyInvalid {
                    app: i,
                    dependency: dep.app_idx,
                    reason: format!("index out of range ({} apps)", apps.len()),
                });
            };
            if app.priority >= target.priority {
                return Err(SchedError::DependencyInvalid {
                    app: i,
                    dependency: dep.app_idx,
                    reason: format!(
                        "priority {} is not lower than dependency priority {}",
                        app.priority, target.priority
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Validates clouds and applications before a scheduling run.
///
/// Fails on an empty cloud list, out-of-range priorities, peer tables of the
/// wrong length, remaining placements outside the cloud list, invalid
/// dependencies, and applications carrying timing state from an earlier
/// evaluation.
pub fn validate_inputs(clouds: &[Cloud], apps: &[Application]) -> Result<()> {
    if clouds.is_empty() {
        return Err(SchedError::InvalidInput("no clouds".into()));
    }
    for (c, cloud) in clouds.iter().enumerate() {
        let peers = cloud.net_condition_clouds.len();
        if peers != 0 && peers != clouds.len() {
            return Err(SchedError::InvalidInput(format!(
                "cloud {c} has {peers} peer conditions, expected {}",
                clouds.len()
            )));
        }
    }
    for (i, app) in apps.iter().enumerate() {
        if app.priority == 0 || app.priority > MAX_PRIORITY {
            return Err(SchedError::InvalidInput(format!(
                "app {i} priority {} outside 1..={MAX_PRIORITY}",
                app.priority
            )));
        }
        if !app.is_new && app.cloud_remaining_on >= clouds.len() {
            return Err(SchedError::InvalidInput(format!(
                "app {i} remains on cloud {} but only {} clouds exist",
                app.cloud_remaining_on,
                clouds.len()
            )));
        }
        if !app.timing.is_zero() {
            return Err(SchedError::StaleScratchState { app: i });
        }
    }
    validate_dependencies(apps)
}
