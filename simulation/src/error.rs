//! Experiment setup errors

use std::path::PathBuf;

use courier_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Invalid protocol configuration: {0}")]
    Protocol(#[from] ConfigError),

    #[error("Invalid experiment duration: {0}")]
    InvalidDuration(f64),

    #[error("Invalid fail ratio: {0}")]
    InvalidFailRatio(f64),

    #[error("Address used by more than one endpoint: {0}")]
    DuplicateAddress(String),

    #[error("Failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ExperimentResult<T> = Result<T, ExperimentError>;
