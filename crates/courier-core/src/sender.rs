//! Message-originating endpoint
//!
//! A [`Sender`] runs one send loop per connected peer. Every
//! `send_interval` the loop creates a new random data message, records it as
//! unconfirmed and launches a confirmation routine for it. Earlier messages
//! are never waited on before sending the next one.
//!
//! Per `(peer, message)` the routine walks
//! `Sent -> AwaitingConfirmation -> {Confirmed | Failed}`:
//!
//! - each attempt waits up to `retry_time` for the entry to be confirmed;
//! - an elapsed window re-dispatches the retained message while attempts
//!   remain;
//! - after `max_retries` elapsed windows the message has failed and its
//!   entry is left in the table.
//!
//! Dropping (or aborting) the task running [`Sender::run`] abandons every
//! loop, routine and in-flight dispatch it started.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::config::ProtocolConfig;
use crate::endpoint::{Address, Endpoint, PeerSet};
use crate::error::ConfigError;
use crate::id::IdGenerator;
use crate::message::Message;
use crate::pending::{PendingConfirmations, PendingTicket};
use crate::stats::DeliveryStats;
use crate::transport::Transport;

/// Lifecycle of one outstanding `(peer, message)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Dispatched, no confirmation window opened yet
    Sent,
    /// Waiting on the given attempt's window
    AwaitingConfirmation { attempt: u32 },
    /// Acknowledged during the given attempt
    Confirmed { attempts: u32 },
    /// Every attempt elapsed without acknowledgement
    Failed { attempts: u32 },
}

impl DeliveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }
}

/// Endpoint that originates data messages and tracks their confirmation
#[derive(Debug)]
pub struct Sender {
    address: Address,
    peers: PeerSet,
    config: ProtocolConfig,
    ids: Arc<IdGenerator>,
    stats: Arc<DeliveryStats>,
    pending: PendingConfirmations,
}

impl Sender {
    /// Create a sender, rejecting configurations its loops cannot run with
    pub fn new(
        address: impl Into<Address>,
        config: ProtocolConfig,
        ids: Arc<IdGenerator>,
        stats: Arc<DeliveryStats>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            address: address.into(),
            peers: PeerSet::new(),
            config,
            ids,
            stats,
            pending: PendingConfirmations::new(),
        })
    }

    pub fn pending(&self) -> &PendingConfirmations {
        &self.pending
    }

    pub fn stats(&self) -> &Arc<DeliveryStats> {
        &self.stats
    }

    /// Spawn [`Sender::run`] as a background task
    pub fn spawn(self: &Arc<Self>, transport: Arc<Transport>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(transport))
    }

    /// Run one send loop per connected peer until cancelled
    pub async fn run(self: Arc<Self>, transport: Arc<Transport>) {
        let span = info_span!("sender", address = %self.address);
        async move {
            let peers = self.peers.to_vec();
            if peers.is_empty() {
                warn!("Sender has no peers, nothing to send");
                return;
            }
            info!(peers = peers.len(), "Sender is running");

            let mut loops = JoinSet::new();
            for peer in peers {
                loops.spawn(
                    Arc::clone(&self)
                        .send_loop(Arc::clone(&transport), peer)
                        .in_current_span(),
                );
            }

            while let Some(result) = loops.join_next().await {
                if let Err(e) = result {
                    error!(error = %e, "Send loop ended unexpectedly");
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Originate one message to `peer` and drive it to a terminal state
    pub async fn deliver(&self, transport: &Arc<Transport>, peer: &Address) -> DeliveryState {
        let (message, ticket) = self.originate(peer);
        self.confirm_delivery(transport, message, ticket).await
    }

    async fn send_loop(self: Arc<Self>, transport: Arc<Transport>, peer: Address) {
        let mut routines = JoinSet::new();
        let mut ticker = tokio::time::interval(self.config.send_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (message, ticket) = self.originate(&peer);
            let this = Arc::clone(&self);
            let transport = Arc::clone(&transport);
            routines.spawn(
                async move {
                    this.confirm_delivery(&transport, message, ticket).await;
                }
                .in_current_span(),
            );

            // Reap finished routines so the set does not grow unbounded.
            while routines.try_join_next().is_some() {}
        }
    }

    /// Create a new data message for `peer` and record it as unconfirmed
    fn originate(&self, peer: &Address) -> (Message, PendingTicket) {
        let message = Message::random_data(self.config.message_size, &self.ids, &mut rand::rng());
        let ticket = self.pending.track(peer.clone(), message.id());
        self.stats.record_sent();
        debug!(%peer, id = %message.id(), "Waiting for confirmation");
        (message, ticket)
    }

    async fn confirm_delivery(
        &self,
        transport: &Arc<Transport>,
        message: Message,
        mut ticket: PendingTicket,
    ) -> DeliveryState {
        let peer = ticket.peer().clone();
        let window = self.config.retry_time();
        let max_retries = self.config.max_retries;

        // Dispatches of this message; abandoned once the outcome is known.
        let mut dispatches = JoinSet::new();
        self.dispatch(&mut dispatches, transport, &peer, &message);
        let mut state = DeliveryState::Sent;
        trace!(%peer, id = %message.id(), ?state, "Message dispatched");

        for attempt in 1..=max_retries {
            state = DeliveryState::AwaitingConfirmation { attempt };
            trace!(%peer, id = %message.id(), ?state, "Confirmation window opened");

            if ticket.wait_confirmed(window).await {
                self.pending.release(&ticket);
                self.stats.record_success();
                info!(
                    %peer,
                    id = %message.id(),
                    content = message.content(),
                    attempt,
                    "Confirmed receipt of message"
                );
                return DeliveryState::Confirmed { attempts: attempt };
            }

            if attempt < max_retries {
                debug!(%peer, id = %message.id(), retry = attempt, "Retrying message");
                self.dispatch(&mut dispatches, transport, &peer, &message);
            }
            while dispatches.try_join_next().is_some() {}
        }

        self.stats.record_failure();
        error!(
            %peer,
            id = %message.id(),
            content = message.content(),
            timestamp = message.timestamp(),
            "Failed to send message"
        );
        DeliveryState::Failed {
            attempts: max_retries,
        }
    }

    /// Apply a confirmation received from `from`, judging expiry as of `now`
    ///
    /// Returns whether a pending entry was flipped. Malformed, non-confirmation
    /// and expired messages are ignored, as are confirmations for entries
    /// that are unknown or already confirmed.
    pub fn apply_confirmation(
        &self,
        from: &Address,
        message: &Message,
        now: DateTime<Utc>,
    ) -> bool {
        if !message.id().is_valid() || !message.is_confirmation() || message.is_expired_at(now) {
            debug!(%from, id = %message.id(), "Ignoring malformed or expired confirmation");
            return false;
        }

        match self.pending.confirm(from, message.id()) {
            Ok(()) => true,
            Err(e) => {
                warn!(address = %self.address, error = %e, "Could not apply confirmation");
                false
            }
        }
    }

    /// Hand a fresh copy of `message` to the transport
    fn dispatch(
        &self,
        dispatches: &mut JoinSet<()>,
        transport: &Arc<Transport>,
        peer: &Address,
        message: &Message,
    ) {
        let transport = Arc::clone(transport);
        let from = self.address.clone();
        let to = peer.clone();
        let message = message.clone();
        dispatches.spawn(
            async move { transport.send(&from, &to, message).await }.in_current_span(),
        );
    }
}

#[async_trait]
impl Endpoint for Sender {
    fn address(&self) -> &Address {
        &self.address
    }

    fn peers(&self) -> &PeerSet {
        &self.peers
    }

    async fn receive(&self, _transport: &Transport, from: &Address, message: Message) {
        debug!(
            address = %self.address,
            %from,
            id = %message.id(),
            content = message.content(),
            timestamp = message.timestamp(),
            "Received message"
        );

        self.apply_confirmation(from, &message, Utc::now());
    }
}
