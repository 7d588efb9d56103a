//! Error types for model construction.

use samcnet_prob::ProbError;
use thiserror::Error;

/// Errors raised while building a structure model from data.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// No variables were given.
    #[error("Model needs at least one variable")]
    NoVariables,

    /// A variable was declared with zero states.
    #[error("Variable {variable} has no states")]
    EmptyStateSpace { variable: usize },

    /// The template is not an n x n matrix.
    #[error("Template must be {expected}x{expected}, found a row of length {got}")]
    TemplateShape { expected: usize, got: usize },

    /// An observation has the wrong number of columns.
    #[error("Observation {row} has {got} values, expected {expected}")]
    DataShape {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// An observed value lies outside its variable's state space.
    #[error("Observation {row}: variable {variable} = {value} but it only has {states} states")]
    DataOutOfRange {
        row: usize,
        variable: usize,
        value: usize,
        states: usize,
    },

    /// The ground network does not describe the same variables.
    #[error("Ground network state counts {ground:?} do not match model state counts {model:?}")]
    GroundMismatch {
        ground: Vec<usize>,
        model: Vec<usize>,
    },

    /// The joint state space is too large to enumerate.
    #[error("Joint state space of {size} configurations exceeds the limit of {limit}")]
    JointTooLarge { size: usize, limit: usize },

    /// Weight of the structure prior must be finite and non-negative.
    #[error("Invalid prior weight {weight}")]
    InvalidPriorWeight { weight: f64 },

    /// Probability-layer failure.
    #[error(transparent)]
    Prob(#[from] ProbError),
}
