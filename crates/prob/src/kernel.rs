//! Markov kernels used as conditional probability tables.

use rand::Rng;

use crate::dist::Dist;
use crate::error::ProbError;
use crate::PROB_TOLERANCE;

/// A row-stochastic matrix `k[i][j]` = P(child = j | parent configuration = i).
///
/// In a Bayesian network every factor carries one kernel whose rows are
/// indexed by the encoded parent configuration.
///
/// # Example
///
/// ```rust
/// use samcnet_prob::Kernel;
///
/// // Noisy copy of a binary parent
/// let cpt = Kernel::new(vec![
///     vec![0.9, 0.1],
///     vec![0.1, 0.9],
/// ]).unwrap();
/// assert_eq!(cpt.n_inputs, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Row-stochastic matrix.
    pub k: Vec<Vec<f64>>,
    /// Number of parent configurations (rows).
    pub n_inputs: usize,
    /// Number of child states (columns).
    pub n_outputs: usize,
}

impl Kernel {
    /// Create a kernel from a row-stochastic matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty, ragged, has a negative
    /// entry, or a row does not sum to 1.
    pub fn new(k: Vec<Vec<f64>>) -> Result<Self, ProbError> {
        if k.is_empty() {
            return Err(ProbError::EmptyKernel);
        }

        let n_inputs = k.len();
        let n_outputs = k[0].len();
        if n_outputs == 0 {
            return Err(ProbError::EmptyKernel);
        }

        for (i, row) in k.iter().enumerate() {
            if row.len() != n_outputs {
                return Err(ProbError::RaggedMatrix);
            }
            if row.iter().any(|&x| x < -PROB_TOLERANCE) {
                return Err(ProbError::NegativeProbability);
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > PROB_TOLERANCE {
                return Err(ProbError::RowNotNormalized { row: i, sum });
            }
        }

        Ok(Self {
            k,
            n_inputs,
            n_outputs,
        })
    }

    /// Build a kernel from distributions, one per row.
    pub fn from_rows(rows: Vec<Dist>) -> Result<Self, ProbError> {
        Self::new(rows.into_iter().map(|d| d.p).collect())
    }

    /// Kernel that ignores its input and always returns `dist`.
    pub fn constant(n_inputs: usize, dist: &Dist) -> Self {
        Self {
            k: vec![dist.p.clone(); n_inputs],
            n_inputs,
            n_outputs: dist.p.len(),
        }
    }

    /// Every row drawn independently from a symmetric Dirichlet(alpha).
    pub fn dirichlet<R: Rng + ?Sized>(
        n_inputs: usize,
        n_outputs: usize,
        alpha: f64,
        rng: &mut R,
    ) -> Result<Self, ProbError> {
        let rows = (0..n_inputs)
            .map(|_| Dist::dirichlet(n_outputs, alpha, rng))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }
}
