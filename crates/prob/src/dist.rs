//! Probability distributions over finite sets.

use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

use crate::error::ProbError;
use crate::PROB_TOLERANCE;

/// A probability distribution over a finite set {0, 1, ..., n-1}.
///
/// Invariants:
/// - All probabilities are non-negative
/// - Probabilities sum to 1 (within tolerance)
///
/// # Example
///
/// ```rust
/// use samcnet_prob::Dist;
///
/// let coin = Dist::bernoulli(0.5).unwrap();
/// assert!((coin.entropy() - 2.0_f64.ln()).abs() < 1e-12);
///
/// let certain = Dist::new(vec![0.0, 1.0, 0.0]).unwrap();
/// assert_eq!(certain.entropy(), 0.0);
/// assert_eq!(certain.sample(0.3), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dist {
    /// Probability vector (sums to 1).
    pub p: Vec<f64>,
}

impl Dist {
    /// Create a new distribution from a probability vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector is empty, holds a negative entry,
    /// or does not sum to 1 (within tolerance).
    pub fn new(p: Vec<f64>) -> Result<Self, ProbError> {
        if p.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }

        if p.iter().any(|&x| x < -PROB_TOLERANCE) {
            return Err(ProbError::NegativeProbability);
        }

        let sum: f64 = p.iter().sum();
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            return Err(ProbError::NotNormalized { sum });
        }

        Ok(Self { p })
    }

    /// Create a distribution from unnormalized weights.
    ///
    /// ```rust
    /// use samcnet_prob::Dist;
    ///
    /// let d = Dist::from_weights(vec![1.0, 2.0, 3.0]).unwrap();
    /// assert!((d.p[2] - 0.5).abs() < 1e-12);
    /// ```
    pub fn from_weights(weights: Vec<f64>) -> Result<Self, ProbError> {
        if weights.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }

        if weights.iter().any(|&x| x < 0.0) {
            return Err(ProbError::NegativeProbability);
        }

        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return Err(ProbError::ZeroWeights);
        }

        Ok(Self {
            p: weights.into_iter().map(|w| w / sum).collect(),
        })
    }

    /// Bernoulli distribution over {0, 1} with P(1) = `p1`.
    pub fn bernoulli(p1: f64) -> Result<Self, ProbError> {
        Self::new(vec![1.0 - p1, p1])
    }

    /// Draw a distribution from a symmetric Dirichlet(alpha, ..., alpha).
    ///
    /// A single outcome always gets the point mass.
    pub fn dirichlet<R: Rng + ?Sized>(n: usize, alpha: f64, rng: &mut R) -> Result<Self, ProbError> {
        if n == 0 {
            return Err(ProbError::EmptyDistribution);
        }
        if !(alpha > 0.0 && alpha.is_finite()) {
            return Err(ProbError::InvalidDirichlet {
                reason: format!("alpha must be positive and finite, got {alpha}"),
            });
        }
        if n == 1 {
            return Ok(Self { p: vec![1.0] });
        }
        let dirichlet =
            Dirichlet::new_with_size(alpha, n).map_err(|e| ProbError::InvalidDirichlet {
                reason: e.to_string(),
            })?;
        // Tiny alphas can underflow every component; from_weights reports that.
        Self::from_weights(dirichlet.sample(rng))
    }

    /// The number of outcomes in the sample space.
    pub fn len(&self) -> usize {
        self.p.len()
    }

    /// Check if the distribution is over an empty set (always false for valid Dist).
    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// Shannon entropy in nats: `H(p) = -Σ p[i] ln p[i]`.
    ///
    /// Outcomes with zero probability contribute 0.
    pub fn entropy(&self) -> f64 {
        entropy(&self.p)
    }

    /// KL divergence `D_KL(self || other) = Σ p[i] ln(p[i] / q[i])`.
    ///
    /// Returns infinity if self has support where other has zero probability.
    pub fn kl_divergence(&self, other: &Dist) -> Result<f64, ProbError> {
        kl_divergence(&self.p, &other.p)
    }

    /// Inverse-CDF sampling from a uniform value in [0, 1).
    pub fn sample(&self, u: f64) -> usize {
        sample_index(&self.p, u)
    }
}

/// Inverse-CDF lookup in a non-empty probability vector.
pub(crate) fn sample_index(p: &[f64], u: f64) -> usize {
    let mut cumsum = 0.0;
    for (i, &pi) in p.iter().enumerate() {
        cumsum += pi;
        if u < cumsum {
            return i;
        }
    }
    // u at the top of the range or rounding in the cumulative sum
    p.len() - 1
}

/// Entropy of a probability vector (nats).
pub(crate) fn entropy(p: &[f64]) -> f64 {
    p.iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| -x * x.ln())
        .sum()
}

/// KL divergence between two probability vectors of equal length.
pub(crate) fn kl_divergence(p: &[f64], q: &[f64]) -> Result<f64, ProbError> {
    if p.len() != q.len() {
        return Err(ProbError::ShapeMismatch {
            expected: p.len(),
            got: q.len(),
        });
    }

    let mut kl = 0.0;
    for (&pi, &qi) in p.iter().zip(q) {
        if pi > 0.0 {
            if qi <= 0.0 {
                return Ok(f64::INFINITY);
            }
            kl += pi * (pi / qi).ln();
        }
    }
    // Rounding can push identical inputs slightly negative.
    Ok(kl.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_dist_new_valid() {
        let d = Dist::new(vec![0.3, 0.7]).unwrap();
        assert_eq!(d.len(), 2);
        assert!((d.p[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_dist_new_not_normalized() {
        let result = Dist::new(vec![0.3, 0.6]);
        assert!(matches!(result, Err(ProbError::NotNormalized { .. })));
    }

    #[test]
    fn test_dist_new_negative() {
        let result = Dist::new(vec![-0.5, 1.5]);
        assert!(matches!(result, Err(ProbError::NegativeProbability)));
    }

    #[test]
    fn test_from_weights_zero() {
        assert!(matches!(
            Dist::from_weights(vec![0.0, 0.0]),
            Err(ProbError::ZeroWeights)
        ));
    }

    #[test]
    fn test_entropy_uniform_and_point() {
        let d = Dist::from_weights(vec![1.0; 4]).unwrap();
        assert!((d.entropy() - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(Dist::new(vec![1.0, 0.0, 0.0, 0.0]).unwrap().entropy(), 0.0);
    }

    #[test]
    fn test_kl_divergence_zero_and_infinite() {
        let p = Dist::new(vec![0.5, 0.5]).unwrap();
        assert!(p.kl_divergence(&Dist::bernoulli(0.5).unwrap()).unwrap().abs() < 1e-12);

        let q = Dist::new(vec![1.0, 0.0]).unwrap();
        assert!(p.kl_divergence(&q).unwrap().is_infinite());
        // q has no mass where p is missing, so the reverse direction is finite
        assert!((q.kl_divergence(&p).unwrap() - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_kl_shape_mismatch() {
        let p = Dist::bernoulli(0.5).unwrap();
        let q = Dist::from_weights(vec![1.0; 3]).unwrap();
        assert!(matches!(
            p.kl_divergence(&q),
            Err(ProbError::ShapeMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_sample() {
        let d = Dist::new(vec![0.3, 0.7]).unwrap();
        assert_eq!(d.sample(0.0), 0);
        assert_eq!(d.sample(0.29), 0);
        assert_eq!(d.sample(0.31), 1);
        assert_eq!(d.sample(1.0), 1);
    }

    #[test]
    fn test_dirichlet_is_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = Dist::dirichlet(5, 1.0, &mut rng).unwrap();
        let sum: f64 = d.p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(d.p.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_dirichlet_rejects_bad_alpha() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            Dist::dirichlet(3, -1.0, &mut rng),
            Err(ProbError::InvalidDirichlet { .. })
        ));
    }

    #[test]
    fn test_dirichlet_rejects_nan_alpha() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            Dist::dirichlet(3, f64::NAN, &mut rng),
            Err(ProbError::InvalidDirichlet { .. })
        ));
    }

    #[test]
    fn test_dirichlet_single_outcome_is_point() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Dist::dirichlet(1, 0.5, &mut rng).unwrap().p, vec![1.0]);
    }
}
