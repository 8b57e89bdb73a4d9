//! Hybrid ant-colony/genetic scheduling (HAGA).
//!
//! - [`HagaConfig`]: grouping, pheromone and inner-search parameters
//! - [`partition_groups`]: dependency-closed application groups
//! - [`Pheromone`]: per-cloud load memory shared across groups
//! - [`Haga`]: the scheduler

mod config;
mod grouping;
mod pheromone;
mod runner;

pub use config::HagaConfig;
pub use grouping::partition_groups;
pub use pheromone::Pheromone;
pub use runner::Haga;
