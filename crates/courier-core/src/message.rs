//! Data and confirmation messages
//!
//! A [`Message`] is immutable once built, apart from the id corruption the
//! transport applies to its own in-flight copy. Whether a message is a
//! confirmation is decided by the presence of an expiry, not by a flag.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::id::IdGenerator;

/// Content carried by every confirmation message
pub const CONFIRMATION_CONTENT: &str = "receipt confirmed";

/// Alphabet of generated data payloads
const PAYLOAD_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Identifier of a message
///
/// Generated ids are non-negative. Corruption in flight may produce any
/// value, including negative ones, which receivers treat as malformed.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[display("{_0}")]
pub struct MessageId(i64);

impl MessageId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Whether this id could have come from an uncorrupted sender
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Shift the id by `offset`, saturating at the bounds of `i64`
    pub const fn offset(self, offset: i64) -> Self {
        Self(self.0.saturating_add(offset))
    }
}

/// A message travelling over the simulated transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    content: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Build a data message, drawing its id from `ids`
    pub fn data(content: impl Into<String>, ids: &IdGenerator) -> Self {
        Self {
            id: ids.next_id(),
            content: content.into(),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Build a data message with a random `A-Z0-9` payload of `size` characters
    pub fn random_data<R: Rng + ?Sized>(size: usize, ids: &IdGenerator, rng: &mut R) -> Self {
        let content: String = (0..size)
            .map(|_| PAYLOAD_CHARSET[rng.random_range(0..PAYLOAD_CHARSET.len())] as char)
            .collect();
        Self::data(content, ids)
    }

    /// Build a confirmation for `id`, valid for `expiration` from now
    pub fn confirmation(content: impl Into<String>, id: MessageId, expiration: Duration) -> Self {
        let created_at = Utc::now();
        let lifetime = TimeDelta::from_std(expiration).unwrap_or(TimeDelta::MAX);
        let expires_at = created_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            id,
            content: content.into(),
            created_at,
            expires_at: Some(expires_at),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Creation time as UTC epoch seconds
    pub fn timestamp(&self) -> i64 {
        self.created_at.timestamp()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// A message is a confirmation iff it carries an expiry
    pub fn is_confirmation(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Whether this confirmation has expired as of now
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether this confirmation has expired as of `now`
    ///
    /// Data messages never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Perturb the id; only the transport does this, on its own copy
    pub(crate) fn corrupt(&mut self, offset: i64) {
        self.id = self.id.offset(offset);
    }
}
