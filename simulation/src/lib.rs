//! # Courier Simulation
//!
//! Experiment driver for the send-and-confirm protocol in `courier-core`.
//!
//! An experiment connects every sender to every receiver over one simulated
//! transport, lets the senders run for a fixed time and reports the share of
//! messages that were confirmed. A sweep repeats the experiment over several
//! error rates.
//!
//! ## Architecture
//!
//! - **Config** (`config.rs`): experiment and sweep parameters, JSON loading
//! - **Experiment** (`experiment.rs`): wiring, timed run, report
//! - **Sweep** (`sweep.rs`): one experiment per error rate
//! - **Report** (`report.rs`): text table and success/failure bar
//! - **CLI** (`cli.rs`): flags of the `courier` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use courier_simulation::*;
//!
//! let config = ExperimentConfig {
//!     duration_secs: 30.0,
//!     ..Default::default()
//! };
//! let report = Experiment::new(config)?.run().await;
//! println!("{}", render_report(&report));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod experiment;
pub mod report;
pub mod sweep;

pub use config::{ExperimentConfig, SweepConfig};
pub use error::{ExperimentError, ExperimentResult};
pub use experiment::{Experiment, ExperimentReport};
pub use report::{render_report, render_sweep};
pub use sweep::run_sweep;
