//! The SAMC run: adaptive region weights, acceptance rule and recording.
//!
//! At iteration `t` the chain targets `p(x) / exp(θ[J(x)])`, where `J(x)` is
//! the energy region of `x`. After each step the weights move by the gain
//! `γₜ = t₀ / max(t₀, t)` towards the desired region frequencies `ρ`:
//!
//! ```text
//! θ ← θ + γₜ (e_J(xₜ) − ρ)
//! ```
//!
//! Over-visited regions are penalized until every region is visited in
//! proportion to `ρ`, which lets the chain cross energy barriers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SamcError;
use crate::grid::EnergyGrid;
use crate::target::SamcTarget;
use crate::trace::Trace;

/// Tunables of a SAMC run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamcConfig {
    /// Iterations before samples are recorded.
    pub burn: u64,
    /// Gain-factor scale `t₀`.
    pub stepscale: f64,
    /// Exponent of the desired region distribution `ρᵢ ∝ exp(-refden · i)`.
    pub refden: f64,
    /// Record every `thin`-th iteration after burn-in.
    pub thin: u64,
    /// Number of energy regions.
    pub grid_size: usize,
    /// Metropolis steps used to estimate the energy range.
    pub pilot_iters: u64,
    /// Fraction of the pilot range added on both sides of the grid.
    pub range_margin: f64,
}

impl Default for SamcConfig {
    fn default() -> Self {
        Self {
            burn: 100_000,
            stepscale: 100_000.0,
            refden: 0.0,
            thin: 100,
            grid_size: 20,
            pilot_iters: 2_000,
            range_margin: 0.1,
        }
    }
}

impl SamcConfig {
    /// Reject values the sampler cannot run with.
    pub fn validate(&self) -> Result<(), SamcError> {
        if self.thin == 0 {
            return Err(SamcError::InvalidConfig {
                reason: "thin must be at least 1".into(),
            });
        }
        if !(self.stepscale > 0.0 && self.stepscale.is_finite()) {
            return Err(SamcError::InvalidConfig {
                reason: format!("stepscale must be positive, got {}", self.stepscale),
            });
        }
        if self.grid_size == 0 {
            return Err(SamcError::InvalidConfig {
                reason: "grid_size must be at least 1".into(),
            });
        }
        if !self.refden.is_finite() {
            return Err(SamcError::InvalidConfig {
                reason: format!("refden must be finite, got {}", self.refden),
            });
        }
        if !(self.range_margin >= 0.0 && self.range_margin.is_finite()) {
            return Err(SamcError::InvalidConfig {
                reason: format!("range_margin must be >= 0, got {}", self.range_margin),
            });
        }
        Ok(())
    }

    /// Desired region frequencies `ρ`.
    pub fn reference_density(&self) -> Vec<f64> {
        let raw: Vec<f64> = (0..self.grid_size)
            .map(|i| (-self.refden * i as f64).exp())
            .collect();
        let sum: f64 = raw.iter().sum();
        raw.into_iter().map(|r| r / sum).collect()
    }
}

/// Summary of the chain's behaviour so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamcDiagnostics {
    pub iterations: u64,
    pub accepted: u64,
    pub acceptance_rate: f64,
    pub recorded: usize,
    pub effective_sample_size: f64,
    pub best_energy: f64,
    pub best_statistics: Vec<f64>,
    pub region_counts: Vec<u64>,
    pub theta: Vec<f64>,
    pub energy_range: (f64, f64),
}

/// A SAMC chain over a target model.
#[derive(Debug)]
pub struct SamcRun<T> {
    target: T,
    config: SamcConfig,
    grid: EnergyGrid,
    rho: Vec<f64>,
    theta: Vec<f64>,
    counts: Vec<u64>,
    iteration: u64,
    accepted: u64,
    best_energy: f64,
    best_statistics: Vec<f64>,
    trace: Trace,
}

impl<T: SamcTarget> SamcRun<T> {
    /// Prepare a run, estimating the energy range with a pilot chain when
    /// the target does not report bounds.
    pub fn new<R: Rng + ?Sized>(
        mut target: T,
        config: SamcConfig,
        rng: &mut R,
    ) -> Result<Self, SamcError> {
        config.validate()?;

        let start = target.energy();
        if !start.is_finite() {
            return Err(SamcError::NonFiniteStart { energy: start });
        }

        let grid = match target.energy_bounds() {
            Some((low, high)) => EnergyGrid::new(low, high, config.grid_size)?,
            None => {
                let (low, high) = pilot_range(&mut target, config.pilot_iters, rng);
                tracing::debug!(low, high, pilot_iters = config.pilot_iters, "pilot energy range");
                EnergyGrid::from_observed(low, high, config.range_margin, config.grid_size)?
            }
        };

        let best_energy = target.energy();
        let best_statistics = target.statistics();
        Ok(Self {
            rho: config.reference_density(),
            theta: vec![0.0; config.grid_size],
            counts: vec![0; config.grid_size],
            target,
            config,
            grid,
            iteration: 0,
            accepted: 0,
            best_energy,
            best_statistics,
            trace: Trace::default(),
        })
    }

    /// Run `iters` more iterations at `temperature`.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        iters: u64,
        temperature: f64,
        rng: &mut R,
    ) -> Result<(), SamcError> {
        if !(temperature > 0.0 && temperature.is_finite()) {
            return Err(SamcError::InvalidTemperature { temperature });
        }

        tracing::info!(
            iters,
            temperature,
            start_iteration = self.iteration,
            regions = self.grid.len(),
            "starting SAMC sampling"
        );

        let mut old_energy = self.target.energy();
        let mut old_region = self.grid.region(old_energy);

        for _ in 0..iters {
            self.iteration += 1;
            let t = self.iteration;

            self.target.propose(rng);
            let new_energy = self.target.energy();

            let accept = if new_energy.is_finite() {
                let new_region = self.grid.region(new_energy);
                let r = self.theta[old_region] - self.theta[new_region]
                    + (old_energy - new_energy) / temperature;
                r > 0.0 || rng.gen::<f64>().ln() < r
            } else {
                false
            };

            if accept {
                old_energy = new_energy;
                old_region = self.grid.region(new_energy);
                self.accepted += 1;
                if new_energy < self.best_energy {
                    self.best_energy = new_energy;
                    self.best_statistics = self.target.statistics();
                }
            } else {
                self.target.reject();
            }

            let gain = self.config.stepscale / self.config.stepscale.max(t as f64);
            for (i, (theta, rho)) in self.theta.iter_mut().zip(&self.rho).enumerate() {
                let hit = if i == old_region { 1.0 } else { 0.0 };
                *theta += gain * (hit - rho);
            }
            self.counts[old_region] += 1;

            if t > self.config.burn && t % self.config.thin == 0 {
                self.trace.push(
                    t,
                    self.theta[old_region],
                    old_energy,
                    self.target.statistics(),
                );
            }
        }

        let diag = self.diagnostics();
        tracing::info!(
            iterations = diag.iterations,
            acceptance_rate = diag.acceptance_rate,
            recorded = diag.recorded,
            best_energy = diag.best_energy,
            "SAMC sampling finished"
        );
        tracing::debug!(region_counts = ?diag.region_counts, theta = ?diag.theta, "region weights");
        Ok(())
    }

    /// Importance-weighted mean of `accessor` over the recorded samples.
    pub fn func_mean<F>(&self, accessor: F) -> Result<f64, SamcError>
    where
        F: Fn(&[f64]) -> f64,
    {
        self.trace
            .weighted_mean(accessor)
            .ok_or_else(|| self.empty_trace())
    }

    /// Running importance-weighted mean, one value per recorded sample.
    pub fn func_cummean<F>(&self, accessor: F) -> Result<Vec<f64>, SamcError>
    where
        F: Fn(&[f64]) -> f64,
    {
        if self.trace.is_empty() {
            return Err(self.empty_trace());
        }
        Ok(self.trace.weighted_cummean(accessor))
    }

    fn empty_trace(&self) -> SamcError {
        SamcError::EmptyTrace {
            iterations: self.iteration,
            burn: self.config.burn,
        }
    }

    pub fn diagnostics(&self) -> SamcDiagnostics {
        SamcDiagnostics {
            iterations: self.iteration,
            accepted: self.accepted,
            acceptance_rate: if self.iteration == 0 {
                0.0
            } else {
                self.accepted as f64 / self.iteration as f64
            },
            recorded: self.trace.len(),
            effective_sample_size: self.trace.effective_sample_size(),
            best_energy: self.best_energy,
            best_statistics: self.best_statistics.clone(),
            region_counts: self.counts.clone(),
            theta: self.theta.clone(),
            energy_range: (self.grid.low(), self.grid.high()),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }
}

/// Plain Metropolis at unit temperature, returning the lowest and highest
/// finite energies seen.
fn pilot_range<T: SamcTarget, R: Rng + ?Sized>(target: &mut T, iters: u64, rng: &mut R) -> (f64, f64) {
    let mut energy = target.energy();
    let (mut low, mut high) = (energy, energy);
    for _ in 0..iters {
        target.propose(rng);
        let proposed = target.energy();
        if !proposed.is_finite() {
            target.reject();
            continue;
        }
        low = low.min(proposed);
        high = high.max(proposed);
        let r = energy - proposed;
        if r > 0.0 || rng.gen::<f64>().ln() < r {
            energy = proposed;
        } else {
            target.reject();
        }
    }
    (low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Walk over `energies.len()` states with uniform symmetric proposals.
    struct Ladder {
        energies: Vec<f64>,
        state: usize,
        previous: usize,
        bounds: bool,
    }

    impl Ladder {
        fn new(energies: Vec<f64>, bounds: bool) -> Self {
            Self {
                energies,
                state: 0,
                previous: 0,
                bounds,
            }
        }
    }

    impl SamcTarget for Ladder {
        fn propose<R: Rng + ?Sized>(&mut self, rng: &mut R) {
            self.previous = self.state;
            self.state = rng.gen_range(0..self.energies.len());
        }

        fn reject(&mut self) {
            self.state = self.previous;
        }

        fn energy(&self) -> f64 {
            self.energies[self.state]
        }

        fn statistics(&self) -> Vec<f64> {
            vec![self.state as f64]
        }

        fn energy_bounds(&self) -> Option<(f64, f64)> {
            self.bounds
                .then(|| (-0.5, self.energies.len() as f64 - 0.5))
        }
    }

    #[test]
    fn test_reference_density() {
        let config = SamcConfig {
            grid_size: 3,
            refden: 1.0,
            ..SamcConfig::default()
        };
        let rho = config.reference_density();
        assert!((rho.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(rho[0] > rho[1] && rho[1] > rho[2]);

        let flat = SamcConfig {
            grid_size: 4,
            ..SamcConfig::default()
        };
        assert!(flat.reference_density().iter().all(|&r| (r - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_config_validation() {
        let bad = SamcConfig {
            thin: 0,
            ..SamcConfig::default()
        };
        assert!(matches!(bad.validate(), Err(SamcError::InvalidConfig { .. })));

        let bad = SamcConfig {
            stepscale: 0.0,
            ..SamcConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_temperature() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut run = SamcRun::new(
            Ladder::new(vec![0.0, 1.0], true),
            SamcConfig::default(),
            &mut rng,
        )
        .unwrap();
        assert!(matches!(
            run.sample(10, 0.0, &mut rng),
            Err(SamcError::InvalidTemperature { .. })
        ));
    }

    #[test]
    fn test_burn_and_thin_control_recording() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SamcConfig {
            burn: 100,
            thin: 10,
            grid_size: 2,
            ..SamcConfig::default()
        };
        let mut run = SamcRun::new(Ladder::new(vec![0.0, 1.0], true), config, &mut rng).unwrap();
        run.sample(1_000, 1.0, &mut rng).unwrap();
        assert_eq!(run.trace().len(), 90);
        assert_eq!(run.trace().iterations[0], 110);
        assert_eq!(run.iteration(), 1_000);
    }

    #[test]
    fn test_empty_trace_is_an_error() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut run = SamcRun::new(
            Ladder::new(vec![0.0, 1.0], true),
            SamcConfig::default(),
            &mut rng,
        )
        .unwrap();
        run.sample(50, 1.0, &mut rng).unwrap();
        assert!(matches!(
            run.func_mean(|s| s[0]),
            Err(SamcError::EmptyTrace { iterations: 50, .. })
        ));
        assert!(run.func_cummean(|s| s[0]).is_err());
    }

    #[test]
    fn test_pilot_range_covers_visited_energies() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = SamcConfig {
            pilot_iters: 500,
            ..SamcConfig::default()
        };
        let run = SamcRun::new(Ladder::new(vec![0.0, 1.0, 2.0], false), config, &mut rng).unwrap();
        assert!(run.grid().low() < 0.0);
        assert!(run.grid().high() > 2.0);
    }

    #[test]
    fn test_infinite_proposals_are_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = SamcConfig {
            burn: 0,
            thin: 1,
            grid_size: 3,
            ..SamcConfig::default()
        };
        let ladder = Ladder::new(vec![0.0, f64::INFINITY, 2.0], true);
        let mut run = SamcRun::new(ladder, config, &mut rng).unwrap();
        run.sample(2_000, 1.0, &mut rng).unwrap();

        let trace = run.trace();
        assert_eq!(trace.len(), 2_000);
        assert!(trace.energies.iter().all(|e| e.is_finite()));
        assert!(trace.stats.iter().all(|s| s[0] != 1.0));
        assert!(trace.thetas.iter().all(|t| t.is_finite()));
        assert!(run.theta().iter().all(|t| t.is_finite()));
        assert!(run.target().energy().is_finite());
        assert!(run.diagnostics().best_energy.is_finite());
    }

    #[test]
    fn test_non_finite_start_is_an_error() {
        for start in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut rng = StdRng::seed_from_u64(5);
            let result = SamcRun::new(
                Ladder::new(vec![start, 0.0], true),
                SamcConfig::default(),
                &mut rng,
            );
            assert!(matches!(result, Err(SamcError::NonFiniteStart { .. })));
        }
    }
}
