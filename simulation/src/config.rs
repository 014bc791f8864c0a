//! Experiment and sweep configuration
//!
//! Both load from JSON with every field optional; missing fields take the
//! defaults of the reference experiment (two senders, two receivers, two
//! minutes per run).

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use courier_core::ProtocolConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, ExperimentResult};

/// One experiment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// How long senders run before the results are read
    pub duration_secs: f64,
    /// Sender addresses; each is connected to every receiver
    pub senders: Vec<String>,
    /// Receiver addresses
    pub receivers: Vec<String>,
    /// Seed for the transport's fault injection
    pub seed: Option<u64>,
    pub protocol: ProtocolConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            duration_secs: 120.0,
            senders: vec!["a".to_string(), "d".to_string()],
            receivers: vec!["b".to_string(), "c".to_string()],
            seed: None,
            protocol: ProtocolConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ExperimentResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ExperimentError::ReadConfig {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&contents).map_err(|source| ExperimentError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::ZERO)
    }

    /// Check the protocol parameters and the endpoint layout
    pub fn validate(&self) -> ExperimentResult<()> {
        self.protocol.validate()?;

        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(ExperimentError::InvalidDuration(self.duration_secs));
        }

        let mut seen = BTreeSet::new();
        for address in self.senders.iter().chain(&self.receivers) {
            if !seen.insert(address.as_str()) {
                return Err(ExperimentError::DuplicateAddress(address.clone()));
            }
        }
        Ok(())
    }
}

/// A series of experiments over several error rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// `error_chance` of each run, in order
    pub error_rates: Vec<f64>,
    /// Each run's `fail_chance` is `error_chance * fail_ratio`
    pub fail_ratio: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            error_rates: vec![0.1, 0.2, 0.3, 0.4, 0.5],
            fail_ratio: 0.25,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> ExperimentResult<()> {
        if !self.fail_ratio.is_finite() || self.fail_ratio < 0.0 {
            return Err(ExperimentError::InvalidFailRatio(self.fail_ratio));
        }
        Ok(())
    }

    /// `(error_chance, fail_chance)` of every run
    pub fn fault_pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.error_rates
            .iter()
            .map(|&rate| (rate, rate * self.fail_ratio))
    }
}
