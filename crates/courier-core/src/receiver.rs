//! Acknowledging endpoint
//!
//! A [`Receiver`] answers every well-formed data message with a fresh
//! confirmation carrying the same id. It keeps no memory of what it already
//! acknowledged, so duplicates are acknowledged again.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ProtocolConfig;
use crate::endpoint::{Address, Endpoint, PeerSet};
use crate::message::{CONFIRMATION_CONTENT, Message};
use crate::transport::Transport;

#[derive(Debug)]
pub struct Receiver {
    address: Address,
    peers: PeerSet,
    /// Validity window stamped on outgoing confirmations
    expiration: Duration,
}

impl Receiver {
    pub fn new(address: impl Into<Address>, expiration: Duration) -> Self {
        Self {
            address: address.into(),
            peers: PeerSet::new(),
            expiration,
        }
    }

    pub fn from_config(address: impl Into<Address>, config: &ProtocolConfig) -> Self {
        Self::new(address, config.expiration())
    }
}

#[async_trait]
impl Endpoint for Receiver {
    fn address(&self) -> &Address {
        &self.address
    }

    fn peers(&self) -> &PeerSet {
        &self.peers
    }

    async fn receive(&self, transport: &Transport, from: &Address, message: Message) {
        debug!(
            address = %self.address,
            %from,
            id = %message.id(),
            content = message.content(),
            timestamp = message.timestamp(),
            "Received message"
        );

        if !message.id().is_valid() {
            debug!(%from, id = %message.id(), "Got message with invalid id");
            return;
        }

        // Acknowledging a confirmation would bounce between two receivers.
        if message.is_confirmation() {
            debug!(%from, id = %message.id(), "Not acknowledging a confirmation");
            return;
        }

        let confirmation = Message::confirmation(CONFIRMATION_CONTENT, message.id(), self.expiration);
        transport.send(&self.address, from, confirmation).await;
    }
}
