//! Experiment parameters.
//!
//! Defaults reproduce the reference hourglass experiment. A TOML file can
//! replace any subset of them, and command-line flags override the file.

use std::path::Path;

use clap::Args;
use samcnet_prob::DataMethod;
use samcnet_samc::SamcConfig;
use serde::{Deserialize, Serialize};

use crate::error::ExperimentError;

/// Fixed seed of the data-generation stage.
pub const DEFAULT_SEED: u64 = 123456;

/// All parameters of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Node count of the ground graph.
    pub nodes: usize,
    /// SAMC iterations.
    pub iters: u64,
    /// Number of synthetic observations.
    pub numdata: usize,
    /// Weight of the template structure prior.
    pub priorweight: f64,
    /// Number of ground edges revealed in the template.
    pub numtemplate: usize,
    /// Iterations before samples are recorded.
    pub burn: u64,
    /// SAMC gain-factor scale.
    pub stepscale: f64,
    /// Temperature of the acceptance rule.
    pub temperature: f64,
    /// Record every `thin`-th post-burn iteration.
    pub thin: u64,
    /// Exponent of the desired region distribution.
    pub refden: f64,
    /// Seed of the deterministic data-generation stage.
    pub seed: u64,
    /// How ground CPTs are drawn.
    pub method: DataMethod,
    /// Seed of the sampling stage; `None` draws one from the OS.
    pub sample_seed: Option<u64>,
    /// Number of SAMC energy regions.
    pub grid_size: usize,
    /// Pilot iterations used to find the energy range.
    pub pilot_iters: u64,
    /// Largest parent set a proposal may create.
    pub max_parents: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let samc = SamcConfig::default();
        Self {
            nodes: 7,
            iters: 600_000,
            numdata: 20,
            priorweight: 5.0,
            numtemplate: 5,
            burn: 100_000,
            stepscale: 100_000.0,
            temperature: 1.0,
            thin: 100,
            refden: 0.0,
            seed: DEFAULT_SEED,
            method: DataMethod::NoisyLogic,
            sample_seed: None,
            grid_size: samc.grid_size,
            pilot_iters: samc.pilot_iters,
            max_parents: samcnet_model::DEFAULT_MAX_PARENTS,
        }
    }
}

impl ExperimentConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ExperimentError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ExperimentError> {
        let text = std::fs::read_to_string(path).map_err(|source| ExperimentError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Sampler settings derived from this experiment.
    pub fn samc_config(&self) -> SamcConfig {
        SamcConfig {
            burn: self.burn,
            stepscale: self.stepscale,
            refden: self.refden,
            thin: self.thin,
            grid_size: self.grid_size,
            pilot_iters: self.pilot_iters,
            ..SamcConfig::default()
        }
    }

    /// Reject parameters no run could succeed with.
    pub fn validate(&self) -> Result<(), ExperimentError> {
        let fail = |reason: String| Err(ExperimentError::InvalidConfig { reason });

        if self.nodes < 3 {
            return fail(format!("nodes must be at least 3, got {}", self.nodes));
        }
        if self.numdata == 0 {
            return fail("numdata must be at least 1".into());
        }
        if self.iters <= self.burn {
            return fail(format!(
                "iters ({}) must exceed burn ({}) or no sample is recorded",
                self.iters, self.burn
            ));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return fail(format!("temperature must be > 0, got {}", self.temperature));
        }
        if !(self.priorweight >= 0.0 && self.priorweight.is_finite()) {
            return fail(format!("priorweight must be >= 0, got {}", self.priorweight));
        }
        if self.max_parents == 0 {
            return fail("max_parents must be at least 1".into());
        }
        self.samc_config().validate()?;
        Ok(())
    }
}

/// Command-line overrides, one optional flag per parameter.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Node count of the ground graph
    #[arg(long)]
    pub nodes: Option<usize>,
    /// SAMC iterations
    #[arg(long)]
    pub iters: Option<u64>,
    /// Number of synthetic observations
    #[arg(long)]
    pub numdata: Option<usize>,
    /// Weight of the template prior
    #[arg(long)]
    pub priorweight: Option<f64>,
    /// Ground edges revealed in the template
    #[arg(long)]
    pub numtemplate: Option<usize>,
    /// Burn-in iterations
    #[arg(long)]
    pub burn: Option<u64>,
    /// Gain-factor scale
    #[arg(long)]
    pub stepscale: Option<f64>,
    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,
    /// Thinning interval
    #[arg(long)]
    pub thin: Option<u64>,
    /// Desired region density exponent
    #[arg(long)]
    pub refden: Option<f64>,
    /// Data-generation seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Data-generation method (noisylogic or dirichlet)
    #[arg(long)]
    pub method: Option<DataMethod>,
    /// Seed for the sampling stage (default: random)
    #[arg(long)]
    pub sample_seed: Option<u64>,
    /// Number of energy regions
    #[arg(long)]
    pub grid_size: Option<usize>,
    /// Pilot iterations for the energy range
    #[arg(long)]
    pub pilot_iters: Option<u64>,
    /// Maximum parents per node
    #[arg(long)]
    pub max_parents: Option<usize>,
}

impl ConfigOverrides {
    /// Write every flag that was given into `config`.
    pub fn apply(&self, config: &mut ExperimentConfig) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field.clone() {
                    config.$field = v;
                })*
            };
        }
        set!(
            nodes,
            iters,
            numdata,
            priorweight,
            numtemplate,
            burn,
            stepscale,
            temperature,
            thin,
            refden,
            seed,
            method,
            grid_size,
            pilot_iters,
            max_parents,
        );
        if self.sample_seed.is_some() {
            config.sample_seed = self.sample_seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_experiment() {
        let c = ExperimentConfig::default();
        assert_eq!(c.nodes, 7);
        assert_eq!(c.iters, 600_000);
        assert_eq!(c.numdata, 20);
        assert_eq!(c.priorweight, 5.0);
        assert_eq!(c.numtemplate, 5);
        assert_eq!(c.burn, 100_000);
        assert_eq!(c.stepscale, 100_000.0);
        assert_eq!(c.temperature, 1.0);
        assert_eq!(c.thin, 100);
        assert_eq!(c.refden, 0.0);
        assert_eq!(c.seed, 123456);
        assert_eq!(c.method, DataMethod::NoisyLogic);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let c = ExperimentConfig::from_toml_str(
            r#"
            nodes = 9
            method = "dirichlet"
            sample_seed = 4
            "#,
        )
        .unwrap();
        assert_eq!(c.nodes, 9);
        assert_eq!(c.method, DataMethod::Dirichlet);
        assert_eq!(c.sample_seed, Some(4));
        assert_eq!(c.iters, 600_000);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            ExperimentConfig::from_toml_str("nodez = 3"),
            Err(ExperimentError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_overrides_apply() {
        let mut c = ExperimentConfig::default();
        let o = ConfigOverrides {
            iters: Some(10),
            burn: Some(2),
            method: Some(DataMethod::Dirichlet),
            sample_seed: Some(99),
            ..ConfigOverrides::default()
        };
        o.apply(&mut c);
        assert_eq!(c.iters, 10);
        assert_eq!(c.burn, 2);
        assert_eq!(c.method, DataMethod::Dirichlet);
        assert_eq!(c.sample_seed, Some(99));
        assert_eq!(c.nodes, 7);
    }

    #[test]
    fn test_validation() {
        let bad = |f: fn(&mut ExperimentConfig)| {
            let mut c = ExperimentConfig::default();
            f(&mut c);
            c.validate().is_err()
        };
        assert!(bad(|c| c.nodes = 2));
        assert!(bad(|c| c.numdata = 0));
        assert!(bad(|c| c.burn = c.iters));
        assert!(bad(|c| c.temperature = 0.0));
        assert!(bad(|c| c.priorweight = f64::NAN));
        assert!(bad(|c| c.thin = 0));
        assert!(bad(|c| c.max_parents = 0));
    }
}
