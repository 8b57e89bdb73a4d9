//! Per-cloud pheromone table.
//!
//! Pheromone accumulates on clouds that ran long tasks, so a higher value
//! marks a historically loaded cloud and lower values are preferred.

use serde::Serialize;

/// One pheromone value per cloud, never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pheromone {
    values: Vec<f64>,
}

impl Pheromone {
    /// All-zero table for `num_clouds` clouds.
    pub fn new(num_clouds: usize) -> Self {
        Self {
            values: vec![0.0; num_clouds],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Subtracts `amount` from every cloud, flooring at 0.
    pub fn evaporate(&mut self, amount: f64) {
        if !amount.is_finite() {
            return;
        }
        for v in &mut self.values {
            *v = (*v - amount).max(0.0);
        }
    }

    /// Adds `rate × amounts[c]` to every cloud `c`.
    pub fn deposit(&mut self, amounts: &[f64], rate: f64) {
        for (v, &a) in self.values.iter_mut().zip(amounts) {
            if a.is_finite() && a > 0.0 {
                *v += rate * a;
            }
        }
    }

    /// The `k` clouds with the lowest pheromone (ties by index), ascending by
    /// cloud index.
    pub fn preferred(&self, k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]).then(a.cmp(&b)));
        order.truncate(k);
        order.sort_unstable();
        order
    }
}
