//! # SAMC - Stochastic Approximation Monte Carlo
//!
//! An adaptive Metropolis sampler (Liang, Liu & Carroll, 2007) that partitions
//! the energy axis into regions and learns a log-weight `θ` per region so the
//! chain spends a prescribed share of time in each. Low-energy modes then stop
//! trapping the chain, and reweighting the recorded samples by `exp(θ)`
//! recovers expectations under the original target.
//!
//! ## Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::{Rng, SeedableRng};
//! use samcnet_samc::{SamcConfig, SamcRun, SamcTarget};
//!
//! /// Two states with energies 0 and 1.
//! struct Coin { state: usize, previous: usize }
//!
//! impl SamcTarget for Coin {
//!     fn propose<R: Rng + ?Sized>(&mut self, rng: &mut R) {
//!         self.previous = self.state;
//!         self.state = rng.gen_range(0..2);
//!     }
//!     fn reject(&mut self) { self.state = self.previous; }
//!     fn energy(&self) -> f64 { self.state as f64 }
//!     fn statistics(&self) -> Vec<f64> { vec![self.state as f64] }
//!     fn energy_bounds(&self) -> Option<(f64, f64)> { Some((-0.5, 1.5)) }
//! }
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let config = SamcConfig { burn: 100, thin: 1, stepscale: 100.0, grid_size: 2, ..SamcConfig::default() };
//! let mut run = SamcRun::new(Coin { state: 0, previous: 0 }, config, &mut rng).unwrap();
//! run.sample(5_000, 1.0, &mut rng).unwrap();
//!
//! let mean = run.func_mean(|s| s[0]).unwrap();
//! let cummean = run.func_cummean(|s| s[0]).unwrap();
//! assert_eq!(cummean.len(), run.trace().len());
//! assert!((cummean[cummean.len() - 1] - mean).abs() < 1e-12);
//! ```

mod error;
mod grid;
mod sampler;
mod target;
mod trace;

pub use error::SamcError;
pub use grid::EnergyGrid;
pub use sampler::{SamcConfig, SamcDiagnostics, SamcRun};
pub use target::SamcTarget;
pub use trace::Trace;
