//! Error types for the experiment driver.

use std::path::PathBuf;

use samcnet_model::ModelError;
use samcnet_prob::ProbError;
use samcnet_samc::SamcError;
use thiserror::Error;

/// Everything that can stop an experiment.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// A parameter is out of range.
    #[error("Invalid experiment configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The configuration file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Cannot parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Reporting was requested without a result store address.
    #[error("WORKHASH is set but REDIS is not: need the REDIS environment variable defined")]
    MissingRedis,

    /// The result store rejected a connection or command.
    #[error("Result store error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Ground-truth generation failed.
    #[error("Data generation failed: {0}")]
    Prob(#[from] ProbError),

    /// The structure model could not be built.
    #[error("Model construction failed: {0}")]
    Model(#[from] ModelError),

    /// The sampler could not be configured or summarized.
    #[error("Sampler failed: {0}")]
    Samc(#[from] SamcError),

    /// A summary came out NaN or infinite and cannot be encoded as JSON.
    #[error("Summary {name} is not finite ({value})")]
    NonFiniteSummary { name: &'static str, value: f64 },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// zlib compression or decompression failed.
    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    /// An encoded array is not valid base64.
    #[error("Invalid base64 array: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes do not form whole f64 values.
    #[error("Encoded array has {len} bytes, not a multiple of 8")]
    ArrayLength { len: usize },
}
