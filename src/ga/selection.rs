//! Selection strategies.
//!
//! Scalar searches (genetic, HAGA) maximize fitness and select with a
//! roulette wheel over offset-standardized weights, so the best chromosome is
//! never more than [`ROULETTE_MAX_RATIO`] times as likely as the worst.
//! Chromosomes failing the hard-feasibility gate keep a share of their weight
//! (divided by [`UNACCEPTABLE_PENALTY`]) instead of being discarded.
//!
//! NSGA-II uses [`tournament`] with `k = 2` over its own ordering.
//!
//! # References
//!
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use rand::Rng;

use crate::model::{Chromosome, Population};

/// Largest selection-probability ratio between best and worst chromosome.
pub const ROULETTE_MAX_RATIO: f64 = 10.0;

/// Divisor applied to the selection weight of unacceptable chromosomes.
pub const UNACCEPTABLE_PENALTY: f64 = 3.0;

/// Selection strategy for scalar (maximized) fitness.
///
/// # Examples
///
/// ```
/// use u_cloudsched::ga::Selection;
///
/// let sel = Selection::Roulette;
/// let sel = Selection::Tournament(2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Offset-standardized roulette wheel.
    #[default]
    Roulette,

    /// Pick `k` chromosomes at random and keep the best; acceptable
    /// chromosomes beat unacceptable ones, then higher fitness wins.
    Tournament(usize),
}

impl Selection {
    /// Draws a new population of the same size.
    ///
    /// # Panics
    /// Panics if `population` is empty or the slices differ in length.
    pub fn select_population<R: Rng>(
        &self,
        population: &[Chromosome],
        fitness: &[f64],
        acceptable: &[bool],
        rng: &mut R,
    ) -> Population {
        assert!(!population.is_empty(), "cannot select from empty population");
        assert_eq!(population.len(), fitness.len());
        assert_eq!(population.len(), acceptable.len());

        match self {
            Selection::Roulette => {
                let weights = roulette_weights(fitness, acceptable);
                (0..population.len())
                    .map(|_| population[roulette_select(&weights, rng)].clone())
                    .collect()
            }
            Selection::Tournament(k) => {
                let better = |a: usize, b: usize| {
                    (acceptable[a], fitness[a])
                        .partial_cmp(&(acceptable[b], fitness[b]))
                        .is_some_and(|o| o.is_gt())
                };
                (0..population.len())
                    .map(|_| population[tournament(population.len(), *k, rng, better)].clone())
                    .collect()
            }
        }
    }
}

/// Roulette weights for maximized fitness.
///
/// `w_i = f_i − min + offset` with `offset = (max − min) / (ROULETTE_MAX_RATIO − 1)`,
/// so `w_best / w_worst == ROULETTE_MAX_RATIO`. Equal (or non-finite only)
/// fitness gives uniform weights. Non-finite values get the worst weight.
/// Unacceptable chromosomes are divided by [`UNACCEPTABLE_PENALTY`].
pub fn roulette_weights(fitness: &[f64], acceptable: &[bool]) -> Vec<f64> {
    let finite = fitness.iter().copied().filter(|f| f.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
        (lo.min(f), hi.max(f))
    });
    let span = max - min;

    fitness
        .iter()
        .zip(acceptable)
        .map(|(&f, &ok)| {
            let w = if !(span.is_finite() && span > 0.0) {
                1.0
            } else {
                let offset = span / (ROULETTE_MAX_RATIO - 1.0);
                if f.is_finite() {
                    f - min + offset
                } else {
                    offset
                }
            };
            if ok {
                w
            } else {
                w / UNACCEPTABLE_PENALTY
            }
        })
        .collect()
}

/// Spins the wheel once.
pub fn roulette_select<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let n = weights.len();
    if n == 1 {
        return 0;
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

/// Tournament selection: pick `k` random indices in `0..n`, return the one
/// `better` prefers.
pub fn tournament<R: Rng>(
    n: usize,
    k: usize,
    rng: &mut R,
    better: impl Fn(usize, usize) -> bool,
) -> usize {
    let k = k.max(1);
    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if better(idx, best_idx) {
            best_idx = idx;
        }
    }
    best_idx
}
