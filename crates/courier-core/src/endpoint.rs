//! Participants of the simulated network
//!
//! An [`Endpoint`] is anything the [`Transport`] can deliver to. Endpoints
//! never hold references to each other: they only know peer addresses and
//! reach peers by name through the transport.

use std::collections::BTreeSet;

use async_trait::async_trait;
use derive_more::Display;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::transport::Transport;

/// Opaque name of an endpoint in the simulated namespace
#[derive(
    Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display("{_0}")]
pub struct Address(String);

impl Address {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Address {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Addresses an endpoint is logically connected to
#[derive(Debug, Default)]
pub struct PeerSet {
    peers: RwLock<BTreeSet<Address>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer; returns `false` if it was already present
    pub fn insert(&self, peer: Address) -> bool {
        self.peers.write().insert(peer)
    }

    pub fn contains(&self, peer: &Address) -> bool {
        self.peers.read().contains(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Snapshot of the current peers, in address order
    pub fn to_vec(&self) -> Vec<Address> {
        self.peers.read().iter().cloned().collect()
    }
}

/// Capability every participant exposes to the transport
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// This endpoint's address
    fn address(&self) -> &Address;

    /// Peers this endpoint is connected to
    fn peers(&self) -> &PeerSet;

    /// Handle a message the transport delivered from `from`
    ///
    /// Implementations absorb every anomaly locally; nothing is returned to
    /// the transport.
    async fn receive(&self, transport: &Transport, from: &Address, message: Message);

    /// Connect this endpoint and `other` to each other
    ///
    /// Symmetric and idempotent: connecting twice leaves a single entry on
    /// each side.
    fn connect(&self, other: &dyn Endpoint) {
        self.peers().insert(other.address().clone());
        other.peers().insert(self.address().clone());
    }
}
