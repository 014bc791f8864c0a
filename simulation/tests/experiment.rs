//! Experiment and sweep runs on a paused clock

use courier_core::ProtocolConfig;
use courier_simulation::*;
use tokio_test::assert_ok;

fn short(protocol: ProtocolConfig) -> ExperimentConfig {
    ExperimentConfig {
        duration_secs: 10.0,
        seed: Some(7),
        protocol,
        ..Default::default()
    }
}

// ============================================================================
// Single experiments
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_lossless_experiment_confirms_everything() {
    let experiment = assert_ok!(Experiment::new(short(ProtocolConfig::lossless())));

    let report = experiment.run().await;

    // Two senders, two peers each, one message per peer every 0.5s.
    assert!(report.delivery.sent >= 80);
    assert!(report.delivery.successes > 0);
    assert_eq!(report.delivery.failures, 0);
    assert_eq!(report.success_proportion(), Some(1.0));
    assert_eq!(report.transport.dropped, 0);
    assert_eq!(report.transport.unroutable, 0);
}

#[tokio::test(start_paused = true)]
async fn test_total_loss_experiment_confirms_nothing() {
    let protocol = ProtocolConfig::lossless().with_faults(0.0, 1.0);
    let experiment = assert_ok!(Experiment::new(short(protocol)));

    let report = experiment.run().await;

    assert_eq!(report.delivery.successes, 0);
    assert!(report.delivery.failures > 0);
    assert_eq!(report.success_proportion(), Some(0.0));
    assert_eq!(report.transport.delivered, 0);
}

#[tokio::test(start_paused = true)]
async fn test_default_faults_mostly_confirm() {
    let experiment = assert_ok!(Experiment::new(short(ProtocolConfig::default())));

    let report = experiment.run().await;

    assert_eq!(report.error_chance, 0.1);
    assert_eq!(report.fail_chance, 0.025);
    assert!(report.delivery.completed() > 0);
    assert!(report.delivery.completed() <= report.delivery.sent);
    assert!(report.transport.sent >= report.delivery.sent);
}

#[tokio::test(start_paused = true)]
async fn test_senders_without_receivers() {
    let config = ExperimentConfig {
        receivers: Vec::new(),
        ..short(ProtocolConfig::lossless())
    };

    let report = assert_ok!(Experiment::new(config)).run().await;

    assert_eq!(report.delivery.sent, 0);
    assert_eq!(report.transport.sent, 0);
}

// ============================================================================
// Sweeps
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_sweep_runs_each_rate_with_fresh_counters() {
    let base = ExperimentConfig {
        duration_secs: 5.0,
        seed: Some(3),
        ..Default::default()
    };
    let sweep = SweepConfig {
        error_rates: vec![0.0, 0.4],
        fail_ratio: 0.25,
    };

    let reports = assert_ok!(run_sweep(&base, &sweep).await);

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].error_chance, 0.0);
    assert_eq!(reports[0].fail_chance, 0.0);
    assert_eq!(reports[0].transport.corrupted, 0);
    assert_eq!(reports[1].error_chance, 0.4);
    assert_eq!(reports[1].fail_chance, 0.1);

    // Four sender/receiver pairs, ticks at 0.0 through 4.5 (5.0 may race the end).
    for report in &reports {
        assert!((40..=44).contains(&report.delivery.sent));
    }

    let table = render_sweep(&reports);
    assert_eq!(table.lines().count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_report_serializes() {
    let report = Experiment::new(short(ProtocolConfig::lossless()))
        .unwrap()
        .run()
        .await;

    let json = serde_json::to_value(report).unwrap();
    assert_eq!(json["delivery"]["failures"], 0);
    assert!(json["transport"]["delivered"].as_u64().unwrap() > 0);
}
