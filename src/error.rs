//! Error types for scheduling runs.
//!
//! Infeasible chromosomes met during search are not errors; they are
//! penalized or repaired. Only precondition violations and the total
//! absence of a feasible placement surface here.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SchedError>;

/// Errors returned by schedulers and input validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedError {
    /// A dependent application does not have strictly lower priority than
    /// its dependency, or the dependency index is out of range.
    #[error("invalid dependency: app {app} -> app {dependency}: {reason}")]
    DependencyInvalid {
        app: usize,
        dependency: usize,
        reason: String,
    },

    /// The iteration budget was exhausted without ever producing a feasible
    /// chromosome.
    #[error("{strategy}: no acceptable solution found{}", .group.map(|g| format!(" for group {g}")).unwrap_or_default())]
    NoAcceptableSolution {
        strategy: &'static str,
        group: Option<usize>,
    },

    /// An application entered a run with non-zero timing scratch fields.
    #[error("app {app} carries stale timing state from a previous evaluation")]
    StaleScratchState { app: usize },

    /// Structurally invalid clouds or applications.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A strategy configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_group() {
        let e = SchedError::NoAcceptableSolution {
            strategy: "HAGA",
            group: Some(2),
        };
        assert_eq!(e.to_string(), "HAGA: no acceptable solution found for group 2");

        let e = SchedError::NoAcceptableSolution {
            strategy: "NSGA-II",
            group: None,
        };
        assert_eq!(e.to_string(), "NSGA-II: no acceptable solution found");
    }
}
