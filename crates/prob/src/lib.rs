//! # Prob - Discrete Bayesian Networks
//!
//! Finite probability distributions, conditional probability tables and the
//! Bayesian networks built from them, plus the synthetic generators used to
//! produce ground-truth networks for structure-learning experiments.
//!
//! ## Core Concepts
//!
//! - **Distributions**: [`Dist`] over `{0, ..., n-1}` with entropy and KL divergence
//! - **CPTs are kernels**: [`Kernel`] rows are `P(child | parent configuration)`
//! - **Networks factor the joint**: `P(X₁..Xₙ) = ∏ᵢ P(Xᵢ | parents(Xᵢ))`
//! - **Structures**: [`Dag`] adjacency with `petgraph` cycle checks
//! - **Generators**: hourglass graphs, noisy-logic / Dirichlet CPTs, templates
//!
//! ## Example: Hourglass Ground Truth
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use samcnet_prob::{generate_data, hourglass_graph, sample_template, DataMethod};
//!
//! let mut rng = StdRng::seed_from_u64(123456);
//! let graph = hourglass_graph(7).unwrap();
//! let generated = generate_data(&graph, 20, DataMethod::NoisyLogic, &mut rng).unwrap();
//! let template = sample_template(&graph, 5, &mut rng);
//!
//! assert_eq!(generated.data.len(), 20);
//! assert_eq!(template.len(), 7);
//! let sum: f64 = generated.joint.full_joint().probs.iter().sum();
//! assert!((sum - 1.0).abs() < 1e-9);
//! ```

mod bayesnet;
mod dag;
mod dist;
mod error;
pub mod generator;
mod kernel;

pub use bayesnet::{encode_row_major, BayesNet, Factor, JointDist};
pub use dag::Dag;
pub use dist::Dist;
pub use error::ProbError;
pub use generator::{
    generate_data, hourglass_graph, random_dag, sample_template, DataMethod, GeneratedData,
    Template,
};
pub use kernel::Kernel;

/// Tolerance for probability comparisons.
pub const PROB_TOLERANCE: f64 = 1e-9;
