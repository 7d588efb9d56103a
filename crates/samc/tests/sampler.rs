//! Long-run behaviour of the sampler on small discrete targets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use samcnet_samc::{SamcConfig, SamcRun, SamcTarget};

/// A finite state space with one energy per state and uniform proposals.
struct Discrete {
    energies: Vec<f64>,
    state: usize,
    previous: usize,
}

impl Discrete {
    fn new(energies: Vec<f64>) -> Self {
        Self {
            energies,
            state: 0,
            previous: 0,
        }
    }
}

impl SamcTarget for Discrete {
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
        let indicator = if self.state == 0 { 1.0 } else { 0.0 };
        vec![self.state as f64, indicator]
    }

    /// One region per integer energy 0, 2, 4, ...
    fn energy_bounds(&self) -> Option<(f64, f64)> {
        Some((-1.0, 2.0 * self.energies.len() as f64 - 1.0))
    }
}

fn config(regions: usize) -> SamcConfig {
    SamcConfig {
        burn: 1_000,
        stepscale: 1_000.0,
        thin: 1,
        grid_size: regions,
        ..SamcConfig::default()
    }
}

#[test]
fn region_visits_flatten_across_energy_barriers() {
    // Plain Metropolis would sit in state 0 almost surely (e^-8 ≈ 3e-4).
    let energies = vec![0.0, 2.0, 4.0, 6.0, 8.0];
    let mut rng = StdRng::seed_from_u64(2024);
    let mut run = SamcRun::new(Discrete::new(energies), config(5), &mut rng).unwrap();
    run.sample(200_000, 1.0, &mut rng).unwrap();

    let diag = run.diagnostics();
    let total: u64 = diag.region_counts.iter().sum();
    for count in &diag.region_counts {
        let freq = *count as f64 / total as f64;
        assert!(freq > 0.1 && freq < 0.3, "region frequency {freq}");
    }
    assert!(diag.theta.iter().all(|t| t.is_finite()));
}

#[test]
fn reweighted_mean_recovers_boltzmann_expectation() {
    let energies = vec![0.0, 1.0];
    let mut rng = StdRng::seed_from_u64(7);
    let mut run = SamcRun::new(Discrete::new(energies), config(2), &mut rng).unwrap();
    run.sample(200_000, 1.0, &mut rng).unwrap();

    let p0 = 1.0 / (1.0 + (-1.0_f64).exp());
    let estimate = run.func_mean(|s| s[1]).unwrap();
    assert!((estimate - p0).abs() < 0.05, "estimate {estimate} vs {p0}");
}

#[test]
fn cummean_ends_at_mean_and_sampling_resumes() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut run = SamcRun::new(Discrete::new(vec![0.0, 1.0, 3.0]), config(3), &mut rng).unwrap();
    run.sample(5_000, 2.0, &mut rng).unwrap();
    let first = run.trace().len();
    run.sample(5_000, 2.0, &mut rng).unwrap();
    assert_eq!(run.iteration(), 10_000);
    assert_eq!(run.trace().len(), first + 5_000);

    let mean = run.func_mean(|s| s[0]).unwrap();
    let cummean = run.func_cummean(|s| s[0]).unwrap();
    assert_eq!(cummean.len(), run.trace().len());
    assert!((cummean[cummean.len() - 1] - mean).abs() < 1e-9);
}

#[test]
fn best_energy_tracks_minimum_visited() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut target = Discrete::new(vec![3.0, 0.5, 2.0]);
    target.state = 2;
    let mut run = SamcRun::new(target, config(3), &mut rng).unwrap();
    run.sample(2_000, 1.0, &mut rng).unwrap();
    let diag = run.diagnostics();
    assert_eq!(diag.best_energy, 0.5);
    assert_eq!(diag.best_statistics[0], 1.0);
}
