//! Sufficient statistics and the Bayesian-Dirichlet (K2) local score.
//!
//! With a Dirichlet(1, ..., 1) prior on every CPT row the marginal likelihood
//! of node `i` with parent set `π` is
//!
//! ```text
//! P(D_i | π) = ∏ⱼ Γ(rᵢ) / Γ(Nᵢⱼ + rᵢ) · ∏ₖ Γ(Nᵢⱼₖ + 1)
//! ```
//!
//! where `j` ranges over parent configurations and `k` over the node's states.

use samcnet_prob::{encode_row_major, Kernel, ProbError};
use statrs::function::gamma::ln_gamma;

/// Counts `N[j][k]` of node state `k` under parent configuration `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Counts {
    pub n_states: usize,
    pub table: Vec<Vec<u32>>,
}

impl Counts {
    /// Tabulate `node` against `parents` (ascending node order, row-major).
    pub fn tabulate(data: &[Vec<usize>], states: &[usize], node: usize, parents: &[usize]) -> Self {
        let parent_states: Vec<usize> = parents.iter().map(|&p| states[p]).collect();
        let n_configs: usize = parent_states.iter().product();
        let n_states = states[node];

        let mut table = vec![vec![0u32; n_states]; n_configs];
        let mut values = Vec::with_capacity(parents.len());
        for row in data {
            values.clear();
            values.extend(parents.iter().map(|&p| row[p]));
            table[encode_row_major(&parent_states, &values)][row[node]] += 1;
        }
        Self { n_states, table }
    }

    /// Log marginal likelihood of these counts under a flat Dirichlet prior.
    pub fn log_marginal_likelihood(&self) -> f64 {
        let r = self.n_states as f64;
        let ln_gamma_r = ln_gamma(r);
        self.table
            .iter()
            .map(|row| {
                let n_ij: u32 = row.iter().sum();
                if n_ij == 0 {
                    return 0.0;
                }
                let cells: f64 = row.iter().map(|&n| ln_gamma(n as f64 + 1.0)).sum();
                ln_gamma_r - ln_gamma(n_ij as f64 + r) + cells
            })
            .sum()
    }

    /// Posterior-mean CPT `(Nᵢⱼₖ + 1) / (Nᵢⱼ + rᵢ)`.
    pub fn posterior_mean(&self) -> Result<Kernel, ProbError> {
        let r = self.n_states as f64;
        let rows = self
            .table
            .iter()
            .map(|row| {
                let n_ij: u32 = row.iter().sum();
                let denom = n_ij as f64 + r;
                row.iter().map(|&n| (n as f64 + 1.0) / denom).collect()
            })
            .collect();
        Kernel::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn data() -> Vec<Vec<usize>> {
        vec![vec![0, 0], vec![0, 0], vec![1, 1], vec![1, 0], vec![1, 1]]
    }

    #[test]
    fn test_tabulate_with_parent() {
        let c = Counts::tabulate(&data(), &[2, 2], 1, &[0]);
        assert_eq!(c.table, vec![vec![2, 0], vec![1, 2]]);
        let root = Counts::tabulate(&data(), &[2, 2], 0, &[]);
        assert_eq!(root.table, vec![vec![2, 3]]);
    }

    #[test]
    fn test_k2_closed_form() {
        // Binary root with counts (2, 3): Γ(2)/Γ(7) · Γ(3)Γ(4) = 12 / 720
        let root = Counts::tabulate(&data(), &[2, 2], 0, &[]);
        let expected = (12.0_f64 / 720.0).ln();
        assert!((root.log_marginal_likelihood() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_rows_contribute_nothing() {
        let c = Counts {
            n_states: 2,
            table: vec![vec![0, 0], vec![1, 0]],
        };
        // Γ(2)/Γ(3) · Γ(2)Γ(1) = 1/2
        assert!((c.log_marginal_likelihood() - 0.5_f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_posterior_mean_rows() {
        let c = Counts::tabulate(&data(), &[2, 2], 1, &[0]);
        let k = c.posterior_mean().unwrap();
        assert!((k.k[0][0] - 0.75).abs() < 1e-12);
        assert!((k.k[1][1] - 0.6).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_scores_and_cpts_are_well_formed(
            data in prop::collection::vec(prop::collection::vec(0usize..3, 3), 0..30)
        ) {
            let states = [3, 3, 3];
            let c = Counts::tabulate(&data, &states, 2, &[0, 1]);
            let total: u32 = c.table.iter().flatten().sum();
            prop_assert_eq!(total as usize, data.len());
            prop_assert!(c.log_marginal_likelihood() <= 1e-9);
            let k = c.posterior_mean().unwrap();
            prop_assert_eq!(k.k.len(), 9);
            for row in &k.k {
                prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
    }
}
