//! Delivery accounting
//!
//! [`DeliveryStats`] is the result sink every sender of an experiment writes
//! to; the driver reads it once the experiment is over.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Shared success/failure counters
#[derive(Debug, Default)]
pub struct DeliveryStats {
    sent: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new unique data message was created and dispatched
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// A message reached `Confirmed`
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// A message reached `Failed`
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            successes: self.successes(),
            failures: self.failures(),
        }
    }
}

/// Point-in-time copy of [`DeliveryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySnapshot {
    /// Unique data messages created
    pub sent: u64,
    pub successes: u64,
    pub failures: u64,
}

impl DeliverySnapshot {
    /// Messages that reached a terminal state
    pub fn completed(&self) -> u64 {
        self.successes + self.failures
    }

    /// Messages created but still awaiting an outcome
    pub fn in_flight(&self) -> u64 {
        self.sent.saturating_sub(self.completed())
    }

    pub fn success_proportion(&self) -> Option<f64> {
        self.proportion(self.successes)
    }

    pub fn failure_proportion(&self) -> Option<f64> {
        self.proportion(self.failures)
    }

    fn proportion(&self, count: u64) -> Option<f64> {
        match self.completed() {
            0 => None,
            total => Some(count as f64 / total as f64),
        }
    }
}
