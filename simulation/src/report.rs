//! Text rendering of experiment results
//!
//! The success/failure split is drawn as a proportional bar: `#` for
//! confirmed messages, `.` for failed ones.

use std::fmt::Write;

use crate::experiment::ExperimentReport;

/// Width of the success/failure bar in characters
pub const BAR_WIDTH: usize = 40;

/// Render a single experiment
pub fn render_report(report: &ExperimentReport) -> String {
    let delivery = &report.delivery;
    let transport = &report.transport;
    let mut output = String::new();

    output.push_str("Experiment results:\n");
    let _ = writeln!(output, "  Error chance:        {:.3}", report.error_chance);
    let _ = writeln!(output, "  Fail chance:         {:.3}", report.fail_chance);
    let _ = writeln!(output, "  Unique messages:     {}", delivery.sent);
    let _ = writeln!(output, "  Confirmed:           {}", delivery.successes);
    let _ = writeln!(output, "  Failed:              {}", delivery.failures);
    let _ = writeln!(output, "  Still in flight:     {}", delivery.in_flight());

    match delivery.success_proportion() {
        Some(proportion) => {
            let _ = writeln!(output, "  Success proportion:  {}", percent(proportion));
            let _ = writeln!(output, "  [{}]", bar(proportion, BAR_WIDTH));
        }
        None => output.push_str("  Success proportion:  n/a (no completed messages)\n"),
    }

    let _ = writeln!(
        output,
        "  Transport: {} sent, {} delivered, {} corrupted, {} dropped, {} unroutable",
        transport.sent,
        transport.delivered,
        transport.corrupted,
        transport.dropped,
        transport.unroutable
    );
    output
}

/// Render a sweep as one table row per error rate
pub fn render_sweep(reports: &[ExperimentReport]) -> String {
    let mut output = String::new();

    output.push_str("Sweep results:\n");
    let _ = writeln!(
        output,
        "  {:>6}  {:>6}  {:>7}  {:>9}  {:>6}  {:>7}",
        "error", "fail", "unique", "confirmed", "failed", "success"
    );

    for report in reports {
        let delivery = &report.delivery;
        let (success, chart) = match delivery.success_proportion() {
            Some(proportion) => (percent(proportion), bar(proportion, BAR_WIDTH / 2)),
            None => ("n/a".to_string(), String::new()),
        };
        let _ = writeln!(
            output,
            "  {:>6.3}  {:>6.3}  {:>7}  {:>9}  {:>6}  {:>7}  {}",
            report.error_chance,
            report.fail_chance,
            delivery.sent,
            delivery.successes,
            delivery.failures,
            success,
            chart
        );
    }
    output
}

fn percent(proportion: f64) -> String {
    format!("{:.1}%", proportion * 100.0)
}

/// `width` characters split between `#` and `.` in proportion
fn bar(proportion: f64, width: usize) -> String {
    let filled = ((proportion.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut bar = "#".repeat(filled);
    bar.push_str(&".".repeat(width - filled));
    bar
}
