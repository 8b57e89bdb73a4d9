//! Multi-objective scheduling with NSGA-II.
//!
//! Minimizes total service repair time and total dependency latency
//! overhead. See [`Nsga2`].
//!
//! # Submodules
//!
//! - [`multi_objective`]: non-dominated sorting, crowding distance and
//!   environmental selection

mod config;
pub mod multi_objective;
mod runner;

pub use config::Nsga2Config;
pub use runner::Nsga2;
