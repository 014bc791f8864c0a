//! Parameter sweep over error rates

use tracing::info;

use crate::config::{ExperimentConfig, SweepConfig};
use crate::error::ExperimentResult;
use crate::experiment::{Experiment, ExperimentReport};

/// Run one experiment per error rate, each with fresh counters
///
/// Every run uses `base` with its fault probabilities replaced. All
/// configurations are validated before the first run starts.
pub async fn run_sweep(
    base: &ExperimentConfig,
    sweep: &SweepConfig,
) -> ExperimentResult<Vec<ExperimentReport>> {
    sweep.validate()?;

    let configs = sweep
        .fault_pairs()
        .map(|(error_chance, fail_chance)| {
            let config = ExperimentConfig {
                protocol: base.protocol.clone().with_faults(error_chance, fail_chance),
                ..base.clone()
            };
            config.validate().map(|()| config)
        })
        .collect::<ExperimentResult<Vec<_>>>()?;

    let mut reports = Vec::with_capacity(configs.len());
    for (run, config) in configs.into_iter().enumerate() {
        info!(
            run = run + 1,
            of = sweep.error_rates.len(),
            error_chance = config.protocol.error_chance,
            "Sweep step"
        );
        reports.push(Experiment::new(config)?.run().await);
    }
    Ok(reports)
}
