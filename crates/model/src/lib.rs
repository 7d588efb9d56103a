//! # Model - Templated Bayesian-Network Structures
//!
//! [`BayesNetCpd`] is the state space the SAMC sampler walks when learning a
//! network structure from discrete data. Each state is a DAG; its energy
//! rewards agreement with a prior template of believed edges and the K2
//! marginal likelihood of the data. The tracked statistics are the entropy of
//! the model joint and its KL divergence from the ground-truth joint.
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use samcnet_model::BayesNetCpd;
//! use samcnet_prob::{generate_data, hourglass_graph, sample_template, DataMethod};
//! use samcnet_samc::{SamcConfig, SamcRun};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let graph = hourglass_graph(5).unwrap();
//! let gen = generate_data(&graph, 20, DataMethod::NoisyLogic, &mut rng).unwrap();
//! let template = sample_template(&graph, 2, &mut rng);
//!
//! let ground = BayesNetCpd::gold(gen.states.clone(), gen.data.clone(), template.clone(), &gen.joint, 5.0).unwrap();
//! let model = BayesNetCpd::new(gen.states, gen.data, template, &ground, 5.0).unwrap();
//!
//! let config = SamcConfig { burn: 200, stepscale: 200.0, thin: 10, ..SamcConfig::default() };
//! let mut run = SamcRun::new(model, config, &mut rng).unwrap();
//! run.sample(2_000, 1.0, &mut rng).unwrap();
//! assert!(run.func_mean(|s| s[1]).unwrap() >= 0.0);
//! ```

mod cpd;
mod error;
mod score;

pub use cpd::{BayesNetCpd, DEFAULT_MAX_PARENTS, ENTROPY, KLD, MAX_JOINT_STATES};
pub use error::ModelError;
pub use score::Counts;
