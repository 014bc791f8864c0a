//! Error types for Courier
//!
//! Almost nothing in the protocol engine is fatal: lost, corrupted and
//! misaddressed messages are ordinary simulation outcomes. These types exist
//! so the places that detect an anomaly can name it before logging it, and so
//! construction can reject a nonsensical configuration.

use thiserror::Error;

use crate::endpoint::Address;
use crate::message::MessageId;

/// Top-level error type for Courier
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors raised while validating a [`ProtocolConfig`](crate::ProtocolConfig)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Probability {name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Duration {name} must be finite and non-negative, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },

    #[error("Interval {name} must be positive, got {value}")]
    NonPositiveInterval { name: &'static str, value: f64 },

    #[error("Message id space must hold at least one id, got {0}")]
    EmptyIdSpace(i64),
}

/// Errors related to the simulated transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Can't recognize endpoint with address {0}")]
    UnknownAddress(Address),
}

/// Errors related to confirmation bookkeeping
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("No pending message {id} for peer {peer}")]
    UnknownEntry { peer: Address, id: MessageId },

    #[error("Message {id} to peer {peer} is already confirmed")]
    AlreadyConfirmed { peer: Address, id: MessageId },
}

/// Result type alias for Courier operations
pub type CourierResult<T> = Result<T, CourierError>;
