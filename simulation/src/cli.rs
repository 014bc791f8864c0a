//! Command-line interface of the `courier` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ExperimentConfig, SweepConfig};
use crate::error::ExperimentResult;

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    about = "Send-and-confirm delivery experiments over a lossy simulated network",
    version
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines instead of pretty output
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also write JSONL logs into this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a single experiment
    Run(ExperimentArgs),

    /// Run one experiment per error rate
    Sweep {
        #[command(flatten)]
        experiment: ExperimentArgs,

        /// Error rates to sweep, comma separated
        #[arg(long, value_delimiter = ',')]
        error_rates: Option<Vec<f64>>,

        /// Fail chance as a fraction of each error rate
        #[arg(long)]
        fail_ratio: Option<f64>,
    },
}

/// Experiment parameters; flags override values from `--config`
#[derive(Debug, Clone, Default, Args)]
pub struct ExperimentArgs {
    /// JSON file with experiment settings
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Experiment duration in seconds
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Probability that a hop corrupts the message id
    #[arg(long)]
    pub error_chance: Option<f64>,

    /// Probability that a hop drops the message
    #[arg(long)]
    pub fail_chance: Option<f64>,

    /// Seconds to wait for a confirmation before resending
    #[arg(long)]
    pub retry_time: Option<f64>,

    /// Attempts before a message counts as failed
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Mean per-hop delay in seconds
    #[arg(long)]
    pub mean_delay: Option<f64>,

    /// Standard deviation of the per-hop delay in seconds
    #[arg(long)]
    pub delay_std_dev: Option<f64>,

    /// Seconds between new messages to each peer
    #[arg(long)]
    pub send_interval: Option<f64>,

    /// Seconds a confirmation stays valid
    #[arg(long)]
    pub expiration: Option<f64>,

    /// Size of the message id space
    #[arg(long)]
    pub max_message_id: Option<i64>,

    /// Payload length of data messages
    #[arg(long)]
    pub message_size: Option<usize>,

    /// Sender addresses, comma separated
    #[arg(long, value_delimiter = ',')]
    pub senders: Option<Vec<String>>,

    /// Receiver addresses, comma separated
    #[arg(long, value_delimiter = ',')]
    pub receivers: Option<Vec<String>>,

    /// Seed the transport for reproducible fault injection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExperimentArgs {
    /// Load the base configuration and apply flag overrides
    pub fn resolve(&self) -> ExperimentResult<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_file(path)?,
            None => ExperimentConfig::default(),
        };

        let protocol = &mut config.protocol;
        override_with(&mut config.duration_secs, self.duration);
        override_with(&mut protocol.error_chance, self.error_chance);
        override_with(&mut protocol.fail_chance, self.fail_chance);
        override_with(&mut protocol.retry_time_secs, self.retry_time);
        override_with(&mut protocol.max_retries, self.max_retries);
        override_with(&mut protocol.mean_delay_secs, self.mean_delay);
        override_with(&mut protocol.delay_std_dev_secs, self.delay_std_dev);
        override_with(&mut protocol.send_interval_secs, self.send_interval);
        override_with(&mut protocol.expiration_secs, self.expiration);
        override_with(&mut protocol.max_message_id, self.max_message_id);
        override_with(&mut protocol.message_size, self.message_size);
        override_with(&mut config.senders, self.senders.clone());
        override_with(&mut config.receivers, self.receivers.clone());
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Build the sweep from flags, falling back to the default rates
pub fn resolve_sweep(error_rates: Option<Vec<f64>>, fail_ratio: Option<f64>) -> SweepConfig {
    let mut sweep = SweepConfig::default();
    override_with(&mut sweep.error_rates, error_rates);
    override_with(&mut sweep.fail_ratio, fail_ratio);
    sweep
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_run_defaults() {
        let cli = parse(&["courier", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        assert_eq!(args.resolve().unwrap(), ExperimentConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "courier",
            "--verbose",
            "run",
            "--duration",
            "5",
            "--fail-chance",
            "0.5",
            "--senders",
            "x,y,z",
            "--seed",
            "11",
            "--json",
        ]);
        assert!(cli.verbose);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.json);

        let config = args.resolve().unwrap();
        assert_eq!(config.duration_secs, 5.0);
        assert_eq!(config.protocol.fail_chance, 0.5);
        assert_eq!(config.protocol.error_chance, 0.1);
        assert_eq!(config.senders, ["x", "y", "z"]);
        assert_eq!(config.seed, Some(11));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"duration_secs": 30, "protocol": {{"max_retries": 2, "retry_time_secs": 1.0}}}}"#
        )
        .unwrap();

        let args = ExperimentArgs {
            config: Some(file.path().to_path_buf()),
            max_retries: Some(7),
            ..Default::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.duration_secs, 30.0);
        assert_eq!(config.protocol.retry_time_secs, 1.0);
        assert_eq!(config.protocol.max_retries, 7);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = ExperimentArgs {
            error_chance: Some(2.0),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_sweep_flags() {
        let cli = parse(&[
            "courier",
            "sweep",
            "--error-rates",
            "0.05,0.15",
            "--fail-ratio",
            "0.5",
            "--duration",
            "10",
        ]);
        let Commands::Sweep {
            experiment,
            error_rates,
            fail_ratio,
        } = cli.command
        else {
            panic!("expected sweep");
        };

        let sweep = resolve_sweep(error_rates, fail_ratio);
        assert_eq!(sweep.error_rates, [0.05, 0.15]);
        assert_eq!(sweep.fail_ratio, 0.5);
        assert_eq!(experiment.resolve().unwrap().duration_secs, 10.0);
    }

    #[test]
    fn test_sweep_defaults() {
        let sweep = resolve_sweep(None, None);
        assert_eq!(sweep, SweepConfig::default());
    }
}
