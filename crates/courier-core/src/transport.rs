//! Simulated unreliable transport
//!
//! The [`Transport`] owns the address registry and models a lossy,
//! variable-delay, corrupting link between any two registered endpoints.
//! Every hop independently:
//!
//! | Step       | Effect                                                        |
//! |------------|---------------------------------------------------------------|
//! | Delay      | Sleeps `|N(mean, std_dev)|` seconds (left tail folded)        |
//! | Corruption | With `error_chance`, shifts the id by `U[-max_id/10, max_id/10]` |
//! | Loss       | With `fail_chance`, silently drops the message                |
//! | Delivery   | Calls the recipient's `receive`, or logs an unknown address   |
//!
//! Sends are fire-and-forget: the caller never learns what happened.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::config::ProtocolConfig;
use crate::endpoint::{Address, Endpoint};
use crate::error::{ConfigError, TransportError};
use crate::message::Message;

/// The simulated network shared by every endpoint of an experiment
pub struct Transport {
    /// Address -> endpoint, append/overwrite only
    registry: DashMap<Address, Arc<dyn Endpoint>>,
    /// Per-hop delay distribution, in seconds
    delay: Normal<f64>,
    error_chance: f64,
    fail_chance: f64,
    /// Half-width of the corruption offset range
    corruption_spread: i64,
    rng: Mutex<StdRng>,
    stats: TransportStats,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoints", &self.registry.len())
            .field("delay", &self.delay)
            .field("error_chance", &self.error_chance)
            .field("fail_chance", &self.fail_chance)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Create a transport with an OS-seeded random source
    pub fn new(config: &ProtocolConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create a transport whose fault injection is reproducible from `seed`
    pub fn with_seed(config: &ProtocolConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &ProtocolConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let delay = Normal::new(config.mean_delay_secs, config.delay_std_dev_secs).map_err(
            |_| ConfigError::InvalidDuration {
                name: "delay_std_dev_secs",
                value: config.delay_std_dev_secs,
            },
        )?;

        Ok(Self {
            registry: DashMap::new(),
            delay,
            error_chance: config.error_chance,
            fail_chance: config.fail_chance,
            corruption_spread: config.max_message_id / 10,
            rng: Mutex::new(rng),
            stats: TransportStats::default(),
        })
    }

    /// Register an endpoint under its address, replacing any previous one
    pub fn register(&self, endpoint: Arc<dyn Endpoint>) {
        let address = endpoint.address().clone();
        if self.registry.insert(address.clone(), endpoint).is_some() {
            debug!(%address, "Replaced registered endpoint");
        }
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.registry.contains_key(address)
    }

    /// Registered addresses, sorted
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self
            .registry
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        addresses.sort();
        addresses
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Carry `message` from `from` to `to` across one unreliable hop
    ///
    /// The message is taken by value: whatever happens to it here (notably
    /// corruption) is never visible to the caller's own copy.
    pub async fn send(&self, from: &Address, to: &Address, mut message: Message) {
        self.stats.sent.fetch_add(1, Ordering::Relaxed);
        trace!(%from, %to, id = %message.id(), "Sending message");

        let delay = self.sample_delay();
        tokio::time::sleep(delay).await;
        trace!(delay_secs = delay.as_secs_f64(), "Delay added");

        if let Some(offset) = self.sample_corruption() {
            let original = message.id();
            message.corrupt(offset);
            self.stats.corrupted.fetch_add(1, Ordering::Relaxed);
            debug!(%from, %to, %original, corrupted = %message.id(), "Message id modified due to error");
        }

        if self.sample_loss() {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(%from, %to, id = %message.id(), "Message failed to reach destination");
            return;
        }

        match self.resolve(to) {
            Ok(endpoint) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                endpoint.receive(self, from, message).await;
            }
            Err(e) => {
                self.stats.unroutable.fetch_add(1, Ordering::Relaxed);
                error!(%from, error = %e, "Delivery failed");
            }
        }
    }

    fn resolve(&self, address: &Address) -> Result<Arc<dyn Endpoint>, TransportError> {
        self.registry
            .get(address)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| TransportError::UnknownAddress(address.clone()))
    }

    fn sample_delay(&self) -> Duration {
        let seconds = self.delay.sample(&mut *self.rng.lock());
        Duration::try_from_secs_f64(seconds.abs()).unwrap_or(Duration::ZERO)
    }

    fn sample_corruption(&self) -> Option<i64> {
        let mut rng = self.rng.lock();
        rng.random_bool(self.error_chance)
            .then(|| rng.random_range(-self.corruption_spread..=self.corruption_spread))
    }

    fn sample_loss(&self) -> bool {
        self.rng.lock().random_bool(self.fail_chance)
    }
}

/// Per-transport hop counters
#[derive(Debug, Default)]
pub struct TransportStats {
    sent: AtomicU64,
    delivered: AtomicU64,
    corrupted: AtomicU64,
    dropped: AtomicU64,
    unroutable: AtomicU64,
}

impl TransportStats {
    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            corrupted: self.corrupted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            unroutable: self.unroutable.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TransportStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    /// Hops started (including ones still sleeping)
    pub sent: u64,
    /// Hops handed to a registered endpoint
    pub delivered: u64,
    /// Hops whose message id was perturbed
    pub corrupted: u64,
    /// Hops lost to `fail_chance`
    pub dropped: u64,
    /// Hops addressed to an unknown endpoint
    pub unroutable: u64,
}
