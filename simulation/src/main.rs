//! Courier - delivery experiments over a lossy simulated network

use clap::Parser;
use courier_logging::{CourierSubscriberBuilder, FileConfig, LogConfig};

use courier_simulation::cli::{Cli, Commands, resolve_sweep};
use courier_simulation::{Experiment, render_report, render_sweep, run_sweep};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let mut log_config = if cli.json_logs {
        LogConfig::default()
    } else {
        LogConfig::development()
    };
    log_config.default_level = if cli.verbose { "debug" } else { "info" }.to_string();

    let mut builder = CourierSubscriberBuilder::new().with_config(log_config);
    if let Some(directory) = &cli.log_file {
        builder = builder.with_file_output(FileConfig::in_directory(directory));
    }
    let _guard = builder.init();

    match cli.command {
        Commands::Run(args) => {
            let config = args.resolve()?;
            let report = Experiment::new(config)?.run().await;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report));
            }
        }
        Commands::Sweep {
            experiment,
            error_rates,
            fail_ratio,
        } => {
            let config = experiment.resolve()?;
            let sweep = resolve_sweep(error_rates, fail_ratio);
            let reports = run_sweep(&config, &sweep).await?;

            if experiment.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", render_sweep(&reports));
            }
        }
    }

    Ok(())
}
