//! Multi-cloud workload resource scheduling.
//!
//! Places applications (long-running services and one-shot tasks) onto
//! heterogeneous cloud sites, or rejects them, subject to CPU, memory,
//! storage and latency constraints, migration locks and inter-application
//! dependencies.
//!
//! - **Model** ([`model`]): clouds, applications, placements
//! - **Simulation** ([`deploy`]): feasibility gate, resource accounting and
//!   the image-pull/data-input/execution timeline
//! - **Objectives** ([`fitness`]): weighted resource satisfaction, service
//!   repair time and dependency latency, task completion reward
//! - **Strategies**: [`ga::Genetic`], [`nsga2::Nsga2`], [`haga::Haga`], and
//!   the [`heuristics::FirstFit`] / [`heuristics::RandomFit`] baselines, all
//!   behind the [`Scheduler`] trait
//! - **Metrics** ([`metrics`]): idle rate, acceptance rates, completion time
//!
//! # Architecture
//!
//! Inputs are borrowed immutably; every evaluation deploys onto its own copy
//! of the clouds, so populations are scored in parallel with rayon. Each
//! strategy owns a seedable generator per run and records a
//! [`ga::SearchTrace`] for reporting. The crate logs through `tracing` and
//! installs no subscriber.

pub mod deploy;
pub mod error;
pub mod fitness;
pub mod ga;
pub mod haga;
pub mod heuristics;
pub mod metrics;
pub mod model;
pub mod nsga2;
pub mod random;
mod scheduler;

pub use error::{Result, SchedError};
pub use scheduler::Scheduler;
