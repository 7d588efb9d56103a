//! Recorded samples and the importance-weighted summaries computed from them.

use serde::{Deserialize, Serialize};

/// Samples recorded after burn-in, one entry per thinned iteration.
///
/// Each sample carries the log-weight `θ` of the region it was drawn in;
/// reweighting by `exp(θ)` undoes the flattening SAMC applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub iterations: Vec<u64>,
    pub thetas: Vec<f64>,
    pub energies: Vec<f64>,
    pub stats: Vec<Vec<f64>>,
}

impl Trace {
    pub fn push(&mut self, iteration: u64, theta: f64, energy: f64, stats: Vec<f64>) {
        self.iterations.push(iteration);
        self.thetas.push(theta);
        self.energies.push(energy);
        self.stats.push(stats);
    }

    pub fn len(&self) -> usize {
        self.thetas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thetas.is_empty()
    }

    /// Normalized importance weights `exp(θⱼ - max θ)`.
    pub fn weights(&self) -> Vec<f64> {
        let max = self
            .thetas
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        self.thetas.iter().map(|t| (t - max).exp()).collect()
    }

    /// Weighted mean of `accessor` over all samples; `None` when empty.
    pub fn weighted_mean<F>(&self, accessor: F) -> Option<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        self.weighted_cummean(accessor).last().copied()
    }

    /// Running weighted mean, one value per sample.
    pub fn weighted_cummean<F>(&self, accessor: F) -> Vec<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        let mut num = 0.0;
        let mut den = 0.0;
        self.weights()
            .into_iter()
            .zip(&self.stats)
            .map(|(w, s)| {
                num += w * accessor(s);
                den += w;
                num / den
            })
            .collect()
    }

    /// Kish effective sample size of the importance weights.
    pub fn effective_sample_size(&self) -> f64 {
        let w = self.weights();
        let sum: f64 = w.iter().sum();
        let sum_sq: f64 = w.iter().map(|x| x * x).sum();
        if sum_sq > 0.0 {
            sum * sum / sum_sq
        } else {
            0.0
        }
    }
}
