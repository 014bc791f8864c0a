//! Protocol and transport parameters
//!
//! All times are expressed in seconds as `f64` so a configuration file can
//! say `0.25` instead of spelling out a `Duration`. The accessors convert to
//! [`Duration`] for the runtime.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters of one experiment's protocol engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Probability that a transport hop corrupts the message id
    pub error_chance: f64,
    /// Probability that a transport hop drops the message
    pub fail_chance: f64,
    /// Maximum wait per confirmation attempt before resending
    pub retry_time_secs: f64,
    /// Attempts before a message is declared failed
    pub max_retries: u32,
    /// Mean of the per-hop delay distribution
    pub mean_delay_secs: f64,
    /// Standard deviation of the per-hop delay distribution
    pub delay_std_dev_secs: f64,
    /// Interval between new data messages to each peer
    pub send_interval_secs: f64,
    /// Validity window of a confirmation message
    pub expiration_secs: f64,
    /// Size of the id space; generated ids wrap modulo this value
    pub max_message_id: i64,
    /// Payload length of generated data messages
    pub message_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            error_chance: 0.1,
            fail_chance: 0.025,
            retry_time_secs: 0.25,
            max_retries: 5,
            mean_delay_secs: 0.0,
            delay_std_dev_secs: 0.5,
            send_interval_secs: 0.5,
            expiration_secs: 3.0,
            max_message_id: 100,
            message_size: 2,
        }
    }
}

impl ProtocolConfig {
    /// A perfect link: no loss, no corruption, no delay
    pub fn lossless() -> Self {
        Self {
            error_chance: 0.0,
            fail_chance: 0.0,
            mean_delay_secs: 0.0,
            delay_std_dev_secs: 0.0,
            ..Default::default()
        }
    }

    /// Set both fault probabilities
    pub fn with_faults(mut self, error_chance: f64, fail_chance: f64) -> Self {
        self.error_chance = error_chance;
        self.fail_chance = fail_chance;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_time(&self) -> Duration {
        secs(self.retry_time_secs)
    }

    pub fn send_interval(&self) -> Duration {
        secs(self.send_interval_secs)
    }

    pub fn expiration(&self) -> Duration {
        secs(self.expiration_secs)
    }

    /// Check that every parameter is usable
    ///
    /// Probabilities must lie in `[0, 1]`. Times other than the mean delay
    /// must be finite and non-negative, and the send interval must be
    /// positive. The id space must hold at least one id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("error_chance", self.error_chance),
            ("fail_chance", self.fail_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        // A negative mean is allowed: sampled delays are folded at zero.
        if !self.mean_delay_secs.is_finite() {
            return Err(ConfigError::InvalidDuration {
                name: "mean_delay_secs",
                value: self.mean_delay_secs,
            });
        }

        for (name, value) in [
            ("retry_time_secs", self.retry_time_secs),
            ("delay_std_dev_secs", self.delay_std_dev_secs),
            ("expiration_secs", self.expiration_secs),
            ("send_interval_secs", self.send_interval_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }

        // Sub-nanosecond intervals round to zero as well.
        if self.send_interval().is_zero() {
            return Err(ConfigError::NonPositiveInterval {
                name: "send_interval_secs",
                value: self.send_interval_secs,
            });
        }

        if self.max_message_id < 1 {
            return Err(ConfigError::EmptyIdSpace(self.max_message_id));
        }

        Ok(())
    }
}

/// Convert seconds to a [`Duration`], treating anything invalid as zero
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
