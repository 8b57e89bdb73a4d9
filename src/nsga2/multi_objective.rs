//! Pareto utilities for the NSGA-II scheduler.
//!
//! - [`non_dominated_sort`]: fast non-dominated sorting with constraint
//!   domination (an acceptable chromosome dominates every unacceptable one)
//! - [`crowding_distance`]: diversity measure inside one front
//! - [`select_survivors`]: environmental selection by front, then crowding
//!
//! All objectives are **minimized**.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II",
//!   IEEE Transactions on Evolutionary Computation, 6(2), 182-197

use std::cmp::Ordering;

/// Pareto ranks and the fronts they induce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NondominatedSortResult {
    /// Rank of each solution (0 = first front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` holds the rank-0 indices.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting (Deb et al., 2002), O(m·n²).
///
/// `feasible`, when given, enables constraint domination: a feasible
/// solution dominates any infeasible one, and two solutions of the same
/// feasibility compare by objectives.
///
/// # Example
///
/// ```
/// use u_cloudsched::nsga2::multi_objective::non_dominated_sort;
///
/// let objectives = [[1.0, 5.0], [3.0, 3.0], [4.0, 4.0]];
/// let sorted = non_dominated_sort(&objectives, None);
/// assert_eq!(sorted.ranks, vec![0, 0, 1]);
///
/// // an infeasible solution falls behind every feasible one
/// let sorted = non_dominated_sort(&objectives, Some(&[false, true, true]));
/// assert_eq!(sorted.ranks, vec![2, 0, 1]);
/// ```
pub fn non_dominated_sort<O: AsRef<[f64]>>(
    objectives: &[O],
    feasible: Option<&[bool]>,
) -> NondominatedSortResult {
    let n = objectives.len();
    let is_feasible = |i: usize| feasible.is_none_or(|f| f[i]);

    let mut domination_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            let ord = match (is_feasible(i), is_feasible(j)) {
                (true, false) => Some(Ordering::Less),
                (false, true) => Some(Ordering::Greater),
                _ => pareto_cmp(objectives[i].as_ref(), objectives[j].as_ref()),
            };
            match ord {
                Some(Ordering::Less) => {
                    dominates[i].push(j);
                    domination_count[j] += 1;
                }
                Some(Ordering::Greater) => {
                    dominates[j].push(i);
                    domination_count[i] += 1;
                }
                _ => {}
            }
        }
    }

    let mut ranks = vec![0usize; n];
    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominates[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len() + 1;
                    next.push(j);
                }
            }
        }
        fronts.push(std::mem::replace(&mut current, next));
    }

    NondominatedSortResult { ranks, fronts }
}

/// Pareto comparison for minimization: `Less` when `a` dominates `b`,
/// `Greater` when `b` dominates `a`, `None` otherwise.
fn pareto_cmp(a: &[f64], b: &[f64]) -> Option<Ordering> {
    let mut a_better = false;
    let mut b_better = false;
    for (&va, &vb) in a.iter().zip(b) {
        if va < vb {
            a_better = true;
        } else if vb < va {
            b_better = true;
        }
    }
    match (a_better, b_better) {
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        _ => None,
    }
}

/// Crowding distance of each solution within one front.
///
/// Boundary solutions of any objective get `f64::INFINITY`; interior ones
/// accumulate the normalized gap between their neighbors.
pub fn crowding_distance<O: AsRef<[f64]>>(objectives: &[O]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = objectives[0].as_ref().len();
    let value = |i: usize, k: usize| objectives[i].as_ref()[k];
    let mut distances = vec![0.0f64; n];

    for k in 0..m {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| value(a, k).total_cmp(&value(b, k)));

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = value(order[n - 1], k) - value(order[0], k);
        if range > 0.0 && range.is_finite() {
            for w in order.windows(3) {
                distances[w[1]] += (value(w[2], k) - value(w[0], k)) / range;
            }
        }
    }

    distances
}

/// Environmental selection: keeps `count` indices, whole fronts first, and
/// the least crowded members of the front that does not fit entirely.
///
/// Returns indices into `objectives` in survivor order.
pub fn select_survivors<O: AsRef<[f64]>>(
    objectives: &[O],
    feasible: Option<&[bool]>,
    count: usize,
) -> Vec<usize> {
    let sorted = non_dominated_sort(objectives, feasible);
    let mut survivors = Vec::with_capacity(count);

    for front in sorted.fronts {
        let room = count - survivors.len();
        if room == 0 {
            break;
        }
        if front.len() <= room {
            survivors.extend(front);
            continue;
        }
        let members: Vec<&[f64]> = front.iter().map(|&i| objectives[i].as_ref()).collect();
        let distance = crowding_distance(&members);
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&a, &b| distance[b].total_cmp(&distance[a]));
        survivors.extend(order.into_iter().take(room).map(|k| front[k]));
    }

    survivors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single() {
        let none: [[f64; 2]; 0] = [];
        let sorted = non_dominated_sort(&none, None);
        assert!(sorted.fronts.is_empty());

        let sorted = non_dominated_sort(&[[1.0, 2.0]], None);
        assert_eq!(sorted.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_fronts_by_dominance() {
        let objs = [[1.0, 5.0], [3.0, 3.0], [5.0, 1.0], [4.0, 4.0], [6.0, 6.0]];
        let sorted = non_dominated_sort(&objs, None);
        assert_eq!(sorted.ranks, vec![0, 0, 0, 1, 2]);
        assert_eq!(sorted.fronts.len(), 3);
    }

    #[test]
    fn test_identical_solutions_share_front() {
        let objs = vec![vec![2.0, 2.0]; 3];
        let sorted = non_dominated_sort(&objs, None);
        assert_eq!(sorted.ranks, vec![0, 0, 0]);
    }

    #[test]
    fn test_constraint_domination() {
        // the infeasible one has the best objectives but ranks last
        let objs = [[0.0, 0.0], [3.0, 3.0], [4.0, 4.0]];
        let sorted = non_dominated_sort(&objs, Some(&[false, true, true]));
        assert_eq!(sorted.ranks, vec![2, 0, 1]);

        let sorted = non_dominated_sort(&objs, Some(&[false, false, true]));
        assert_eq!(sorted.ranks, vec![1, 2, 0]);
    }

    #[test]
    fn test_crowding_boundaries_and_spacing() {
        let objs = [[0.0, 4.0], [1.0, 3.0], [2.0, 2.0], [3.0, 1.0], [4.0, 0.0]];
        let d = crowding_distance(&objs);
        assert!(d[0].is_infinite() && d[4].is_infinite());
        assert!((d[1] - d[2]).abs() < 1e-12);
        assert!((d[2] - d[3]).abs() < 1e-12);
        assert!((d[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_flat_objective() {
        let objs = [[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let d = crowding_distance(&objs);
        assert!(d[1].is_finite());
        assert_eq!(crowding_distance(&objs[..2]), vec![f64::INFINITY; 2]);
    }

    #[test]
    fn test_select_survivors_prefers_fronts_then_spread() {
        let objs = [
            [0.0, 4.0],
            [1.0, 3.0],
            [1.1, 2.9],
            [4.0, 0.0],
            [5.0, 5.0],
        ];
        let kept = select_survivors(&objs, None, 3);
        assert_eq!(kept.len(), 3);
        assert!(kept.contains(&0) && kept.contains(&3));
        assert!(!kept.contains(&4));

        let kept = select_survivors(&objs, Some(&[true, true, true, true, true]), 5);
        assert_eq!(kept.len(), 5);
    }
}
