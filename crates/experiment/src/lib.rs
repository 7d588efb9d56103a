//! # samcnet experiment driver
//!
//! One structure-learning experiment end to end: a seeded hourglass network
//! and its noisy observations, a gold model on the true structure, a working
//! model sampled with SAMC, and the entropy and KL-divergence summaries
//! encoded for a shared result store.
//!
//! ```rust
//! use samcnet_experiment::{generate, run, sampling_rng, prepare_data, decode_payload, ExperimentConfig};
//!
//! let config = ExperimentConfig {
//!     nodes: 4,
//!     numdata: 20,
//!     iters: 1_500,
//!     burn: 500,
//!     stepscale: 500.0,
//!     thin: 10,
//!     pilot_iters: 100,
//!     sample_seed: Some(1),
//!     ..ExperimentConfig::default()
//! };
//! let setup = generate(&config).unwrap();
//! let outcome = run(&config, &setup, &mut sampling_rng(&config)).unwrap();
//!
//! let payload = prepare_data(&outcome.summary()).unwrap();
//! let decoded = decode_payload(&payload).unwrap();
//! assert!((decoded.kld_mean - outcome.kld_mean).abs() < 1e-12);
//! assert_eq!(decoded.kld_cummean, outcome.kld_cummean);
//! ```

pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod report;

pub use config::{ConfigOverrides, ExperimentConfig, DEFAULT_SEED};
pub use encode::{decode_array, decode_payload, encode_array, prepare_data, ResultSummary};
pub use error::ExperimentError;
pub use pipeline::{describe_ground, generate, run, sampling_rng, ExperimentOutcome, Setup};
pub use report::{job_key, redis_url, MemorySink, RedisSink, Reporter, ResultSink};
