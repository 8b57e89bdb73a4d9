//! Placement-chromosome operators.
//!
//! Every operator works through a [`GeneSpace`], which knows the legal
//! genes of each application and which positions a search may touch:
//!
//! - a migration-locked application only ever holds `cloud_remaining_on`
//! - a remaining (non-new) application never holds the reject sentinel
//! - a new application may hold any pre-filtered cloud or the sentinel
//!
//! Because both parents of a crossover draw each position from the same
//! candidate set, recombination preserves these locks by construction.
//!
//! # Initialization
//!
//! - [`random_individual`]: uniform gene per active position
//! - [`random_fit_individual`]: randomized greedy construction that keeps
//!   the partial solution acceptable
//! - [`initial_population`]: a configurable mix of the two
//!
//! # Variation
//!
//! - [`crossover_population`]: probability-gated random pairing with
//!   [`Crossover::OnePoint`] or [`Crossover::TwoPoint`]
//! - [`mutate`]: per-gene redraw, always to a different legal gene
//! - [`SlidingWindow`]: swap mutation inside a window that moves by one
//!   position per iteration
//! - [`fix_dependence`]: restores "accepted implies all dependencies
//!   accepted"

use std::ops::Range;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::deploy::{acceptable_scoped, cloud_meet_app};
use crate::model::{Application, Chromosome, Cloud, Population};
use crate::random::shuffle;

/// Legal genes and mutable positions of a search.
#[derive(Debug, Clone)]
pub struct GeneSpace {
    candidates: Vec<Vec<usize>>,
    active: Vec<usize>,
    active_mask: Vec<bool>,
    reject: usize,
}

impl GeneSpace {
    /// Every application is active; every cloud may be offered.
    pub fn new(clouds: &[Cloud], apps: &[Application]) -> Self {
        let all: Vec<usize> = (0..clouds.len()).collect();
        Self::restricted(clouds, apps, (0..apps.len()).collect(), &all)
    }

    /// Only `active` applications vary, and only `allowed` clouds are offered
    /// to them (a remaining application always keeps its previous cloud).
    pub fn restricted(
        clouds: &[Cloud],
        apps: &[Application],
        active: Vec<usize>,
        allowed: &[usize],
    ) -> Self {
        let reject = clouds.len();
        let candidates = apps
            .iter()
            .map(|app| {
                if app.is_locked() {
                    return vec![app.cloud_remaining_on];
                }
                let mut genes: Vec<usize> = allowed
                    .iter()
                    .copied()
                    .filter(|&c| c < reject && cloud_meet_app(&clouds[c], app))
                    .collect();
                if !app.is_new && !genes.contains(&app.cloud_remaining_on) {
                    genes.push(app.cloud_remaining_on);
                }
                if app.can_reject() {
                    genes.push(reject);
                }
                genes
            })
            .collect();

        let mut active_mask = vec![false; apps.len()];
        for &i in &active {
            active_mask[i] = true;
        }

        Self {
            candidates,
            active,
            active_mask,
            reject,
        }
    }

    /// Legal genes of application `app`.
    pub fn candidates(&self, app: usize) -> &[usize] {
        &self.candidates[app]
    }

    /// Positions the search may change, in ascending application order.
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn is_active(&self, app: usize) -> bool {
        self.active_mask.get(app).copied().unwrap_or(false)
    }

    /// The reject sentinel (number of clouds).
    pub fn reject(&self) -> usize {
        self.reject
    }

    /// Membership mask of the active positions.
    pub fn active_mask(&self) -> &[bool] {
        &self.active_mask
    }
}

/// The gene an application holds before any placement decision: its
/// previous cloud if it is remaining, the reject sentinel otherwise.
pub fn default_gene(app: &Application, reject: usize) -> usize {
    if app.is_new {
        reject
    } else {
        app.cloud_remaining_on
    }
}

/// [`default_gene`] for every application.
pub fn default_genes(apps: &[Application], reject: usize) -> Chromosome {
    apps.iter().map(|a| default_gene(a, reject)).collect()
}

/// Copies `base` and draws every active gene uniformly from its candidates.
pub fn random_individual<R: Rng>(space: &GeneSpace, base: &[usize], rng: &mut R) -> Chromosome {
    let mut genes = base.to_vec();
    for &i in space.active() {
        if let Some(&g) = space.candidates(i).choose(rng) {
            genes[i] = g;
        }
    }
    genes
}

/// Randomized greedy construction.
///
/// Active positions start at their default gene. Applications are visited in
/// random order, with dependencies always before their dependents (higher
/// priority first). Each one tries a single random candidate cloud and keeps
/// it only if the partial solution stays acceptable within `scope`.
pub fn random_fit_individual<R: Rng>(
    space: &GeneSpace,
    clouds: &[Cloud],
    apps: &[Application],
    base: &[usize],
    scope: Option<&[bool]>,
    rng: &mut R,
) -> Chromosome {
    let reject = space.reject();
    let mut genes = base.to_vec();
    for &i in space.active() {
        genes[i] = default_gene(&apps[i], reject);
    }

    let mut order = space.active().to_vec();
    shuffle(&mut order, rng);
    order.sort_by(|&a, &b| apps[b].priority.cmp(&apps[a].priority));

    for i in order {
        if apps[i].is_locked() {
            continue;
        }
        let clouds_only: Vec<usize> = space
            .candidates(i)
            .iter()
            .copied()
            .filter(|&g| g < reject)
            .collect();
        let Some(&cloud) = clouds_only.choose(rng) else {
            continue;
        };
        let previous = genes[i];
        genes[i] = cloud;
        if !acceptable_scoped(clouds, apps, &genes, scope) {
            genes[i] = previous;
        }
    }
    genes
}

/// Builds an initial population of `size` chromosomes: the first
/// `round(size × random_fit_ratio)` by [`random_fit_individual`], the rest by
/// [`random_individual`].
#[allow(clippy::too_many_arguments)]
pub fn initial_population<R: Rng>(
    space: &GeneSpace,
    clouds: &[Cloud],
    apps: &[Application],
    base: &[usize],
    scope: Option<&[bool]>,
    size: usize,
    random_fit_ratio: f64,
    rng: &mut R,
) -> Population {
    let fit_count = ((size as f64) * random_fit_ratio).round() as usize;
    (0..size)
        .map(|k| {
            if k < fit_count {
                random_fit_individual(space, clouds, apps, base, scope, rng)
            } else {
                random_individual(space, base, rng)
            }
        })
        .collect()
}

/// Recombination operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crossover {
    /// Swap the tail after one random cut.
    OnePoint,
    /// Swap the segment between two random cuts.
    #[default]
    TwoPoint,
}

impl Crossover {
    /// Recombines two chromosomes in place over the active positions.
    pub fn apply<R: Rng>(
        &self,
        a: &mut [usize],
        b: &mut [usize],
        space: &GeneSpace,
        rng: &mut R,
    ) {
        let active = space.active();
        let m = active.len();
        if m < 2 {
            return;
        }
        let segment = match self {
            Crossover::OnePoint => rng.random_range(1..m)..m,
            Crossover::TwoPoint => {
                let i = rng.random_range(0..m);
                let j = rng.random_range(0..m);
                i.min(j)..i.max(j) + 1
            }
        };
        for &pos in &active[segment] {
            std::mem::swap(&mut a[pos], &mut b[pos]);
        }
    }
}

/// Applies crossover to a probability-gated subset of the population.
///
/// Each chromosome joins the mating pool with probability `rate`; pairs are
/// drawn at random from the pool without reuse. Chromosomes outside the pool
/// (and an odd one left over) pass through unchanged. Returns the indices
/// that were recombined.
pub fn crossover_population<R: Rng>(
    population: &mut Population,
    space: &GeneSpace,
    crossover: Crossover,
    rate: f64,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..population.len())
        .filter(|_| rng.random_bool(rate))
        .collect();
    let mut changed = Vec::with_capacity(pool.len());

    while pool.len() >= 2 {
        let a = pool.swap_remove(rng.random_range(0..pool.len()));
        let b = pool.swap_remove(rng.random_range(0..pool.len()));
        let (lo, hi) = (a.min(b), a.max(b));
        let (left, right) = population.split_at_mut(hi);
        crossover.apply(&mut left[lo], &mut right[0], space, rng);
        changed.push(a);
        changed.push(b);
    }
    changed
}

/// Per-gene mutation: each active gene is redrawn with probability `rate`
/// to a different legal gene (no-op when only one gene is legal).
pub fn mutate<R: Rng>(genes: &mut [usize], space: &GeneSpace, rate: f64, rng: &mut R) {
    for &i in space.active() {
        if !rng.random_bool(rate) {
            continue;
        }
        let candidates = space.candidates(i);
        if let Some(g) = redraw(candidates, genes[i], rng) {
            genes[i] = g;
        }
    }
}

/// A random element of `candidates` different from `current`.
fn redraw<R: Rng>(candidates: &[usize], current: usize, rng: &mut R) -> Option<usize> {
    match candidates.iter().position(|&c| c == current) {
        Some(_) if candidates.len() < 2 => None,
        Some(p) => {
            let mut r = rng.random_range(0..candidates.len() - 1);
            if r >= p {
                r += 1;
            }
            Some(candidates[r])
        }
        None => candidates.choose(rng).copied(),
    }
}

/// Swap mutation over a window of active positions that moves by one
/// position per iteration, bouncing between the ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindow {
    start: usize,
    size: usize,
    forward: bool,
}

impl SlidingWindow {
    /// A window of `size` positions starting at the first active position.
    pub fn new(size: usize) -> Self {
        Self {
            start: 0,
            size: size.max(2),
            forward: true,
        }
    }

    /// Current window over `0..len` (indices into the active positions).
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = self.start.min(len.saturating_sub(1));
        start..(start + self.size).min(len)
    }

    /// Moves the window by one position, reversing at either end.
    pub fn advance(&mut self, len: usize) {
        if len <= self.size {
            self.start = 0;
            return;
        }
        let last_start = len - self.size;
        if self.forward {
            if self.start < last_start {
                self.start += 1;
            } else {
                self.forward = false;
                self.start = self.start.min(last_start).saturating_sub(1);
            }
        } else if self.start > 0 {
            self.start -= 1;
        } else {
            self.forward = true;
            self.start = 1.min(last_start);
        }
    }

    /// Swaps the genes of two distinct positions inside the window when each
    /// gene is legal at the other position. Returns whether a swap happened.
    pub fn swap_mutation<R: Rng>(
        &self,
        genes: &mut [usize],
        space: &GeneSpace,
        rng: &mut R,
    ) -> bool {
        let active = space.active();
        let window = self.range(active.len());
        if window.len() < 2 {
            return false;
        }
        let a = rng.random_range(window.clone());
        let mut b = rng.random_range(window.start..window.end - 1);
        if b >= a {
            b += 1;
        }
        let (i, j) = (active[a], active[b]);
        if genes[i] == genes[j]
            || !space.candidates(i).contains(&genes[j])
            || !space.candidates(j).contains(&genes[i])
        {
            return false;
        }
        genes.swap(i, j);
        true
    }
}

/// Rejects every active, rejectable application that is accepted while one
/// of its dependencies is rejected, until none is left. Returns whether any
/// gene changed.
pub fn reject_orphans(
    genes: &mut [usize],
    apps: &[Application],
    reject: usize,
    active: &[bool],
) -> bool {
    let mut changed_any = false;
    loop {
        let mut changed = false;
        for (i, app) in apps.iter().enumerate() {
            if genes[i] >= reject || !app.can_reject() || !active.get(i).copied().unwrap_or(false) {
                continue;
            }
            if app
                .depend
                .iter()
                .any(|d| genes.get(d.app_idx).is_some_and(|&g| g >= reject))
            {
                genes[i] = reject;
                changed = true;
            }
        }
        if !changed {
            return changed_any;
        }
        changed_any = true;
    }
}

/// Dependency repair.
///
/// An accepted application with a rejected dependency is itself rejected
/// when that is legal; otherwise (a remaining application) the dependency is
/// forced onto one of its legal clouds. Repeats until no violation can be
/// fixed.
pub fn fix_dependence<R: Rng>(
    genes: &mut [usize],
    apps: &[Application],
    space: &GeneSpace,
    rng: &mut R,
) {
    let reject = space.reject();
    for _ in 0..=apps.len() {
        reject_orphans(genes, apps, reject, space.active_mask());

        let mut placed = false;
        for (i, app) in apps.iter().enumerate() {
            if genes[i] >= reject || app.can_reject() {
                continue;
            }
            for dep in &app.depend {
                let j = dep.app_idx;
                if j >= genes.len() || genes[j] < reject || !space.is_active(j) {
                    continue;
                }
                let clouds_only: Vec<usize> = space
                    .candidates(j)
                    .iter()
                    .copied()
                    .filter(|&g| g < reject)
                    .collect();
                if let Some(&c) = clouds_only.choose(rng) {
                    genes[j] = c;
                    placed = true;
                }
            }
        }
        if !placed {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::acceptable;
    use crate::model::{Cpu, Dependence, Requests, Resources, ServiceRequest};
    use crate::random::create_rng;

    fn clouds(n: usize) -> Vec<Cloud> {
        (0..n)
            .map(|_| Cloud::new("c", Resources::new(Cpu::new(8.0, 2.0), 100.0, 100.0, 5.0)))
            .collect()
    }

    fn svc(priority: u32, mem: f64) -> Application {
        Application::service(
            "s",
            priority,
            ServiceRequest {
                requests: Requests::new(1.0, mem, 1.0, 50.0),
                ..Default::default()
            },
        )
    }

    fn in_range(genes: &[usize], reject: usize) -> bool {
        genes.iter().all(|&g| g <= reject)
    }

    #[test]
    fn test_candidate_sets() {
        let cs = clouds(3);
        let apps = vec![
            svc(5, 10.0),
            svc(5, 500.0),
            svc(5, 10.0).remaining_on(2, false),
            svc(5, 500.0).remaining_on(1, true),
        ];
        let space = GeneSpace::new(&cs, &apps);
        assert_eq!(space.candidates(0), &[0, 1, 2, 3]);
        assert_eq!(space.candidates(1), &[3]);
        assert_eq!(space.candidates(2), &[2]);
        assert_eq!(space.candidates(3), &[1]);

        let space = GeneSpace::restricted(&cs, &apps, vec![0, 3], &[2]);
        assert_eq!(space.candidates(0), &[2, 3]);
        assert!(space.is_active(3));
        assert!(!space.is_active(1));
    }

    #[test]
    fn test_random_individual_respects_space() {
        let cs = clouds(3);
        let apps = vec![svc(5, 10.0), svc(5, 10.0).remaining_on(1, false), svc(5, 10.0)];
        let space = GeneSpace::new(&cs, &apps);
        let base = default_genes(&apps, 3);
        let mut rng = create_rng(1);
        for _ in 0..50 {
            let g = random_individual(&space, &base, &mut rng);
            assert_eq!(g.len(), 3);
            assert!(in_range(&g, 3));
            assert_eq!(g[1], 1);
        }
    }

    #[test]
    fn test_random_fit_is_acceptable() {
        let cs = clouds(2);
        let apps: Vec<Application> = (0..8).map(|_| svc(5, 40.0)).collect();
        let space = GeneSpace::new(&cs, &apps);
        let base = default_genes(&apps, 2);
        let mut rng = create_rng(5);
        for _ in 0..20 {
            let g = random_fit_individual(&space, &cs, &apps, &base, None, &mut rng);
            assert!(acceptable(&cs, &apps, &g));
        }
    }

    #[test]
    fn test_random_fit_places_dependencies_first() {
        let cs = clouds(1);
        let apps = vec![
            svc(1, 1.0).with_depend(vec![Dependence::on(1)]),
            svc(2, 1.0).with_depend(vec![Dependence::on(2)]),
            svc(3, 1.0),
        ];
        let space = GeneSpace::new(&cs, &apps);
        let mut rng = create_rng(11);
        let g = random_fit_individual(&space, &cs, &apps, &default_genes(&apps, 1), None, &mut rng);
        assert_eq!(g, vec![0, 0, 0]);
    }

    #[test]
    fn test_crossover_preserves_locks_and_length() {
        let cs = clouds(3);
        let apps = vec![
            svc(5, 1.0),
            svc(5, 1.0).remaining_on(2, false),
            svc(5, 1.0),
            svc(5, 1.0),
        ];
        let space = GeneSpace::new(&cs, &apps);
        let mut rng = create_rng(2);
        let mut population: Population = (0..10)
            .map(|_| random_individual(&space, &default_genes(&apps, 3), &mut rng))
            .collect();
        for kind in [Crossover::OnePoint, Crossover::TwoPoint] {
            crossover_population(&mut population, &space, kind, 1.0, &mut rng);
            for c in &population {
                assert_eq!(c.len(), 4);
                assert!(in_range(c, 3));
                assert_eq!(c[1], 2);
            }
        }
    }

    #[test]
    fn test_crossover_pairs_without_reuse() {
        let cs = clouds(2);
        let apps = vec![svc(5, 1.0), svc(5, 1.0)];
        let space = GeneSpace::new(&cs, &apps);
        let mut rng = create_rng(4);
        let mut population: Population = vec![vec![0, 0]; 7];
        let changed =
            crossover_population(&mut population, &space, Crossover::TwoPoint, 1.0, &mut rng);
        assert_eq!(changed.len(), 6);
        let mut sorted = changed.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_mutation_always_changes_gene() {
        let cs = clouds(3);
        let apps = vec![svc(5, 1.0), svc(5, 1.0).remaining_on(0, false)];
        let space = GeneSpace::new(&cs, &apps);
        let mut rng = create_rng(8);
        for _ in 0..100 {
            let mut genes = vec![1, 0];
            mutate(&mut genes, &space, 1.0, &mut rng);
            assert_ne!(genes[0], 1);
            assert!(genes[0] <= 3);
            assert_eq!(genes[1], 0);
        }
    }

    #[test]
    fn test_sliding_window_bounces() {
        let mut w = SlidingWindow::new(2);
        let mut starts = Vec::new();
        for _ in 0..8 {
            starts.push(w.range(5).start);
            w.advance(5);
        }
        assert_eq!(starts, vec![0, 1, 2, 3, 2, 1, 0, 1]);
        assert_eq!(SlidingWindow::new(4).range(3), 0..3);
    }

    #[test]
    fn test_swap_mutation_respects_candidates() {
        let cs = clouds(2);
        let apps = vec![svc(5, 1.0), svc(5, 1.0).remaining_on(0, false)];
        let space = GeneSpace::new(&cs, &apps);
        let w = SlidingWindow::new(2);
        let mut rng = create_rng(3);
        let mut genes = vec![1, 0];
        assert!(!w.swap_mutation(&mut genes, &space, &mut rng));
        assert_eq!(genes, vec![1, 0]);

        let apps = vec![svc(5, 1.0), svc(5, 1.0)];
        let space = GeneSpace::new(&cs, &apps);
        let mut genes = vec![1, 0];
        assert!(w.swap_mutation(&mut genes, &space, &mut rng));
        assert_eq!(genes, vec![0, 1]);
    }

    #[test]
    fn test_fix_dependence_rejects_new_dependents() {
        let cs = clouds(2);
        let apps = vec![
            svc(9, 1.0),
            svc(5, 1.0).with_depend(vec![Dependence::on(0)]),
            svc(2, 1.0).with_depend(vec![Dependence::on(1)]),
        ];
        let space = GeneSpace::new(&cs, &apps);
        let mut rng = create_rng(1);
        let mut genes = vec![2, 0, 1];
        fix_dependence(&mut genes, &apps, &space, &mut rng);
        assert_eq!(genes, vec![2, 2, 2]);
    }

    #[test]
    fn test_fix_dependence_places_dependency_of_remaining_app() {
        let cs = clouds(2);
        let apps = vec![
            svc(9, 1.0),
            svc(5, 1.0).remaining_on(1, false).with_depend(vec![Dependence::on(0)]),
        ];
        let space = GeneSpace::new(&cs, &apps);
        let mut rng = create_rng(1);
        let mut genes = vec![2, 1];
        fix_dependence(&mut genes, &apps, &space, &mut rng);
        assert!(genes[0] < 2);
        assert_eq!(genes[1], 1);
        assert!(acceptable(&cs, &apps, &genes));
    }
}
