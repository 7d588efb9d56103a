//! Error types for the SAMC sampler.

use thiserror::Error;

/// Errors raised while configuring or summarizing a SAMC run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SamcError {
    /// A configuration value is out of range.
    #[error("Invalid sampler configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Temperature must be strictly positive and finite.
    #[error("Invalid temperature {temperature} (must be > 0)")]
    InvalidTemperature { temperature: f64 },

    /// Energy bounds supplied by the target cannot form a grid.
    #[error("Invalid energy bounds [{low}, {high}]")]
    InvalidEnergyBounds { low: f64, high: f64 },

    /// The target reported a non-finite energy for its starting state.
    #[error("Starting state has non-finite energy {energy}")]
    NonFiniteStart { energy: f64 },

    /// A summary was requested before any sample was recorded.
    #[error("No samples recorded (iterations run: {iterations}, burn-in: {burn})")]
    EmptyTrace { iterations: u64, burn: u64 },
}
