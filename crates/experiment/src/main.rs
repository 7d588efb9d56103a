//! samcnet CLI - run one SAMC structure-learning experiment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use samcnet_experiment::{
    describe_ground, generate, prepare_data, run, sampling_rng, ConfigOverrides,
    ExperimentConfig, Reporter,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "samcnet")]
#[command(version)]
#[command(about = "Bayesian-network structure learning with Stochastic Approximation Monte Carlo")]
struct Cli {
    /// Without a subcommand the experiment runs
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Work hash; when set, the result is pushed to jobs:done:<WORKHASH>
    #[arg(long, env = "WORKHASH", global = true)]
    workhash: Option<String>,

    /// Result store address (host or redis:// URL)
    #[arg(long, env = "REDIS", global = true)]
    redis: Option<String>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as TOML and exit
    Example,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(cli: &Cli) -> Result<ExperimentConfig> {
    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ExperimentConfig::default(),
    };
    cli.overrides.apply(&mut config);
    config.validate().context("Invalid experiment parameters")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = load_config(&cli)?;

    if let Some(Commands::Example) = cli.command {
        print!("{}", toml::to_string(&config).context("Failed to render config")?);
        return Ok(());
    }

    info!("Starting job");

    // Misconfigured reporting must fail before any sampling work.
    let mut reporter = Reporter::from_env(cli.workhash.clone(), cli.redis.clone())
        .context("Cannot set up result reporting")?;
    if let Some(r) = &reporter {
        info!(workhash = r.workhash(), "reporting enabled");
    }

    let setup = generate(&config).context("Failed to generate ground truth")?;
    print!("{}", describe_ground(&setup.ground.joint));

    let mut rng = sampling_rng(&config);
    let outcome = run(&config, &setup, &mut rng).context("Sampling run failed")?;

    println!("KLD Mean is: {}", outcome.kld_mean);
    println!("Entropy Mean is: {}", outcome.entropy_mean);
    info!(
        acceptance_rate = outcome.diagnostics.acceptance_rate,
        effective_sample_size = outcome.diagnostics.effective_sample_size,
        recorded = outcome.diagnostics.recorded,
        "run diagnostics"
    );

    let payload = prepare_data(&outcome.summary()).context("Failed to encode results")?;
    if let Some(reporter) = reporter.as_mut() {
        reporter
            .report(&payload)
            .context("Failed to push results")?;
    }

    info!("Finished job");
    Ok(())
}
