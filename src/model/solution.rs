//! Placement solutions.
//!
//! A chromosome has one gene per application; gene `i` is a cloud index in
//! `[0, num_clouds]`, where `num_clouds` is the reject sentinel.

use serde::{Deserialize, Serialize};

/// One candidate placement (application → cloud index or reject sentinel).
pub type Chromosome = Vec<usize>;

/// A fixed-size set of chromosomes.
pub type Population = Vec<Chromosome>;

/// The final placement returned by a scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub scheduling_result: Vec<usize>,
}

impl Solution {
    /// Wraps a gene vector.
    pub fn new(scheduling_result: Vec<usize>) -> Self {
        Self { scheduling_result }
    }

    /// Every application rejected.
    pub fn all_rejected(num_apps: usize, num_clouds: usize) -> Self {
        Self::new(vec![num_clouds; num_apps])
    }

    pub fn len(&self) -> usize {
        self.scheduling_result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduling_result.is_empty()
    }

    /// Whether application `app` is mapped to the reject sentinel.
    ///
    /// # Panics
    ///
    /// Panics if `app >= self.len()`.
    pub fn is_rejected(&self, app: usize, num_clouds: usize) -> bool {
        self.scheduling_result[app] == num_clouds
    }

    /// The cloud of application `app`, `None` when rejected.
    ///
    /// # Panics
    ///
    /// Panics if `app >= self.len()`.
    pub fn cloud_of(&self, app: usize, num_clouds: usize) -> Option<usize> {
        let gene = self.scheduling_result[app];
        (gene < num_clouds).then_some(gene)
    }
}

impl From<Chromosome> for Solution {
    fn from(genes: Chromosome) -> Self {
        Self::new(genes)
    }
}

impl AsRef<[usize]> for Solution {
    fn as_ref(&self) -> &[usize] {
        &self.scheduling_result
    }
}
