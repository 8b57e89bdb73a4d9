//! Genetic search over placement chromosomes.
//!
//! The pieces shared by every population-based strategy in the crate live
//! here; NSGA-II and HAGA reuse them with their own fitness and loop.
//!
//! # Key Types
//!
//! - [`GaConfig`]: algorithm parameters (population size, rates, seed)
//! - [`Genetic`]: the single-objective scheduler
//! - [`SearchState`] / [`SearchTrace`]: best-known chromosomes and the
//!   per-iteration report
//!
//! # Submodules
//!
//! - [`operators`]: candidate sets, initialization, crossover, mutation and
//!   dependency repair
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
pub mod operators;
mod runner;
mod selection;
mod state;

pub use config::GaConfig;
pub(crate) use config::check_probability;
pub use operators::{Crossover, GeneSpace, SlidingWindow};
pub use runner::Genetic;
pub(crate) use runner::evaluate_population;
pub use selection::{
    roulette_select, roulette_weights, tournament, Selection, ROULETTE_MAX_RATIO,
    UNACCEPTABLE_PENALTY,
};
pub use state::{Direction, Scored, SearchState, SearchTrace};
