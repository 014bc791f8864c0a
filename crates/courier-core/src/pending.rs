//! Pending-confirmation table
//!
//! One entry per `(peer, message id)` a sender is waiting on. Each entry is a
//! `watch` cell holding the "confirmed" flag, so the retry routine can wait
//! on it with a timeout instead of polling.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::warn;

use crate::endpoint::Address;
use crate::error::ProtocolError;
use crate::message::MessageId;

type Key = (Address, MessageId);
type Cell = Arc<watch::Sender<bool>>;

/// A sender's table of messages awaiting acknowledgement
#[derive(Debug, Default)]
pub struct PendingConfirmations {
    entries: DashMap<Key, Cell>,
}

/// Handle held by the routine waiting on one entry
///
/// The ticket keeps its own cell alive: if a later message with the same id
/// supersedes the entry, the ticket keeps waiting on the orphaned cell and
/// can never be confirmed by the newer message's acknowledgement.
#[derive(Debug)]
pub struct PendingTicket {
    key: Key,
    cell: Cell,
    confirmed: watch::Receiver<bool>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly dispatched message as unconfirmed
    pub fn track(&self, peer: Address, id: MessageId) -> PendingTicket {
        let (tx, confirmed) = watch::channel(false);
        let cell = Arc::new(tx);
        let key = (peer, id);

        if self.entries.insert(key.clone(), Arc::clone(&cell)).is_some() {
            warn!(peer = %key.0, %id, "Pending entry superseded by a newer message with the same id");
        }

        PendingTicket {
            key,
            cell,
            confirmed,
        }
    }

    /// Flip the `(peer, id)` entry to confirmed
    ///
    /// Confirming twice is reported, not applied twice.
    pub fn confirm(&self, peer: &Address, id: MessageId) -> Result<(), ProtocolError> {
        let entry = self
            .entries
            .get(&(peer.clone(), id))
            .ok_or_else(|| ProtocolError::UnknownEntry {
                peer: peer.clone(),
                id,
            })?;

        if *entry.value().borrow() {
            return Err(ProtocolError::AlreadyConfirmed {
                peer: peer.clone(),
                id,
            });
        }

        entry.value().send_replace(true);
        Ok(())
    }

    /// Current flag of the `(peer, id)` entry, if any
    pub fn is_confirmed(&self, peer: &Address, id: MessageId) -> Option<bool> {
        self.entries
            .get(&(peer.clone(), id))
            .map(|entry| *entry.value().borrow())
    }

    /// Remove the entry a ticket was issued for
    ///
    /// Leaves the table untouched if the entry has since been superseded.
    pub fn release(&self, ticket: &PendingTicket) -> bool {
        self.entries
            .remove_if(&ticket.key, |_, cell| Arc::ptr_eq(cell, &ticket.cell))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PendingTicket {
    pub fn peer(&self) -> &Address {
        &self.key.0
    }

    pub fn id(&self) -> MessageId {
        self.key.1
    }

    /// Wait up to `window` for the entry to be confirmed
    pub async fn wait_confirmed(&mut self, window: Duration) -> bool {
        matches!(
            tokio::time::timeout(window, self.confirmed.wait_for(|confirmed| *confirmed)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn peer(name: &str) -> Address {
        Address::new(name)
    }

    #[test]
    fn test_track_and_confirm() {
        let table = PendingConfirmations::new();
        let _ticket = table.track(peer("b"), MessageId::new(3));

        assert_eq!(table.is_confirmed(&peer("b"), MessageId::new(3)), Some(false));
        assert_ok!(table.confirm(&peer("b"), MessageId::new(3)));
        assert_eq!(table.is_confirmed(&peer("b"), MessageId::new(3)), Some(true));
    }

    #[test]
    fn test_double_confirm_reported() {
        let table = PendingConfirmations::new();
        let _ticket = table.track(peer("b"), MessageId::new(3));

        assert_ok!(table.confirm(&peer("b"), MessageId::new(3)));
        let err = assert_err!(table.confirm(&peer("b"), MessageId::new(3)));
        assert!(matches!(err, ProtocolError::AlreadyConfirmed { .. }));
        assert_eq!(table.is_confirmed(&peer("b"), MessageId::new(3)), Some(true));
    }

    #[test]
    fn test_unknown_entry() {
        let table = PendingConfirmations::new();
        let _ticket = table.track(peer("b"), MessageId::new(3));

        let err = assert_err!(table.confirm(&peer("c"), MessageId::new(3)));
        assert!(matches!(err, ProtocolError::UnknownEntry { .. }));
        assert_err!(table.confirm(&peer("b"), MessageId::new(4)));
    }

    #[test]
    fn test_release_removes_own_entry() {
        let table = PendingConfirmations::new();
        let ticket = table.track(peer("b"), MessageId::new(1));

        assert!(table.release(&ticket));
        assert!(table.is_empty());
        assert!(!table.release(&ticket));
    }

    #[test]
    fn test_release_keeps_superseding_entry() {
        let table = PendingConfirmations::new();
        let old = table.track(peer("b"), MessageId::new(1));
        let new = table.track(peer("b"), MessageId::new(1));

        assert!(!table.release(&old));
        assert_eq!(table.len(), 1);
        assert!(table.release(&new));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sees_confirmation() {
        let table = Arc::new(PendingConfirmations::new());
        let mut ticket = table.track(peer("b"), MessageId::new(9));

        let confirmer = Arc::clone(&table);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            confirmer.confirm(&peer("b"), MessageId::new(9)).unwrap();
        });

        assert!(ticket.wait_confirmed(Duration::from_millis(250)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let table = PendingConfirmations::new();
        let mut ticket = table.track(peer("b"), MessageId::new(9));

        let start = tokio::time::Instant::now();
        assert!(!ticket.wait_confirmed(Duration::from_millis(250)).await);
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_before_wait_is_seen() {
        let table = PendingConfirmations::new();
        let mut ticket = table.track(peer("b"), MessageId::new(2));
        table.confirm(&peer("b"), MessageId::new(2)).unwrap();

        assert!(ticket.wait_confirmed(Duration::ZERO).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_ticket_never_confirmed() {
        let table = PendingConfirmations::new();
        let mut old = table.track(peer("b"), MessageId::new(5));
        let mut new = table.track(peer("b"), MessageId::new(5));

        table.confirm(&peer("b"), MessageId::new(5)).unwrap();

        assert!(new.wait_confirmed(Duration::from_millis(10)).await);
        assert!(!old.wait_confirmed(Duration::from_millis(10)).await);
    }
}
