//! Message id generation
//!
//! Every data message of an experiment draws its id from one shared
//! [`IdGenerator`]. Ids wrap modulo the configured id space, so uniqueness
//! is only probabilistic once the counter has gone round.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::message::MessageId;

/// Wrapping counter handing out ids in `[0, max_id)`
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicI64,
    max_id: i64,
}

impl IdGenerator {
    /// Create a generator starting at zero
    ///
    /// `max_id` is clamped to at least one so the counter always has an id
    /// to hand out.
    pub fn new(max_id: i64) -> Self {
        Self::starting_at(0, max_id)
    }

    /// Create a generator whose first id is `start` (reduced into range)
    pub fn starting_at(start: i64, max_id: i64) -> Self {
        let max_id = max_id.max(1);
        Self {
            next: AtomicI64::new(start.rem_euclid(max_id)),
            max_id,
        }
    }

    /// Size of the id space
    pub fn max_id(&self) -> i64 {
        self.max_id
    }

    /// Take the next id and advance the counter, wrapping to zero
    pub fn next_id(&self) -> MessageId {
        let max_id = self.max_id;
        let current = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some((n + 1) % max_id)
            })
            .unwrap_or_else(|n| n);
        MessageId::new(current)
    }
}
