//! Search state threaded through every iteration of a population search.
//!
//! A [`SearchState`] owns the best-ever and best-acceptable-ever chromosomes
//! and the [`SearchTrace`] report. Strategies hand it each evaluated
//! population through [`SearchState::observe`]; nothing else persists
//! between iterations.

use serde::Serialize;

use crate::model::Chromosome;

/// Whether larger or smaller fitness is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Whether `a` is strictly better than `b`. NaN is never better.
    pub fn better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::Maximize => a > b,
            Direction::Minimize => a < b,
        }
    }
}

/// A chromosome and its fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub genes: Chromosome,
    pub fitness: f64,
}

/// Per-iteration report of a search, for charts and CSV export.
///
/// `fitness[i]` is the best fitness of the population at iteration `i`;
/// `acceptable_fitness[i]` the best among its acceptable chromosomes (`None`
/// when there was none). The `*_ever` series hold the running best and the
/// `*_update_iterations` lists the iterations where it improved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTrace {
    pub fitness: Vec<f64>,
    pub best_fitness_ever: Vec<f64>,
    pub best_update_iterations: Vec<usize>,
    pub acceptable_fitness: Vec<Option<f64>>,
    pub best_acceptable_ever: Vec<Option<f64>>,
    pub best_acceptable_update_iterations: Vec<usize>,
}

impl SearchTrace {
    /// Number of recorded iterations.
    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }
}

/// Best-known chromosomes plus the trace of one search.
#[derive(Debug, Clone)]
pub struct SearchState {
    direction: Direction,
    best: Option<Scored>,
    best_acceptable: Option<Scored>,
    no_update: usize,
    trace: SearchTrace,
}

impl SearchState {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            best: None,
            best_acceptable: None,
            no_update: 0,
            trace: SearchTrace::default(),
        }
    }

    /// Records one evaluated population.
    ///
    /// Returns `true` when the best acceptable chromosome improved; otherwise
    /// the no-improvement counter grows by one.
    ///
    /// # Panics
    /// Panics if the slices differ in length.
    pub fn observe(
        &mut self,
        iteration: usize,
        population: &[Chromosome],
        fitness: &[f64],
        acceptable: &[bool],
    ) -> bool {
        assert_eq!(population.len(), fitness.len());
        assert_eq!(population.len(), acceptable.len());

        let dir = self.direction;
        let pick = |filter: &dyn Fn(usize) -> bool| {
            (0..population.len())
                .filter(|&i| filter(i) && !fitness[i].is_nan())
                .reduce(|a, b| if dir.better(fitness[b], fitness[a]) { b } else { a })
        };
        let top = pick(&|_| true);
        let top_acceptable = pick(&|i| acceptable[i]);

        if let Some(i) = top {
            if self.best.as_ref().is_none_or(|b| dir.better(fitness[i], b.fitness)) {
                self.best = Some(Scored {
                    genes: population[i].clone(),
                    fitness: fitness[i],
                });
                self.trace.best_update_iterations.push(iteration);
            }
        }

        let mut improved = false;
        if let Some(i) = top_acceptable {
            if self
                .best_acceptable
                .as_ref()
                .is_none_or(|b| dir.better(fitness[i], b.fitness))
            {
                self.best_acceptable = Some(Scored {
                    genes: population[i].clone(),
                    fitness: fitness[i],
                });
                self.trace.best_acceptable_update_iterations.push(iteration);
                improved = true;
            }
        }
        if improved {
            self.no_update = 0;
        } else {
            self.no_update += 1;
        }

        let worst = match dir {
            Direction::Maximize => f64::NEG_INFINITY,
            Direction::Minimize => f64::INFINITY,
        };
        self.trace
            .fitness
            .push(top.map_or(worst, |i| fitness[i]));
        self.trace
            .best_fitness_ever
            .push(self.best.as_ref().map_or(worst, |b| b.fitness));
        self.trace
            .acceptable_fitness
            .push(top_acceptable.map(|i| fitness[i]));
        self.trace
            .best_acceptable_ever
            .push(self.best_acceptable.as_ref().map(|b| b.fitness));

        improved
    }

    /// Consecutive observations without a best-acceptable improvement.
    pub fn no_update(&self) -> usize {
        self.no_update
    }

    pub fn best(&self) -> Option<&Scored> {
        self.best.as_ref()
    }

    pub fn best_acceptable(&self) -> Option<&Scored> {
        self.best_acceptable.as_ref()
    }

    pub fn trace(&self) -> &SearchTrace {
        &self.trace
    }

    /// Consumes the state, returning the best acceptable chromosome and the
    /// trace.
    pub fn finish(self) -> (Option<Scored>, SearchTrace) {
        (self.best_acceptable, self.trace)
    }
}
