//! Experiment driver
//!
//! An [`Experiment`] wires a fresh transport, id generator and result sink to
//! the configured senders and receivers, lets the senders run for the
//! configured duration and reads the counters.

use std::sync::Arc;

use courier_core::{
    DeliverySnapshot, DeliveryStats, Endpoint, IdGenerator, Receiver, Sender, Transport,
    TransportSnapshot,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::error::ExperimentResult;

/// Outcome of one experiment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub error_chance: f64,
    pub fail_chance: f64,
    pub delivery: DeliverySnapshot,
    pub transport: TransportSnapshot,
}

impl ExperimentReport {
    pub fn success_proportion(&self) -> Option<f64> {
        self.delivery.success_proportion()
    }
}

/// A fully wired experiment, ready to run once
#[derive(Debug)]
pub struct Experiment {
    config: ExperimentConfig,
    transport: Arc<Transport>,
    stats: Arc<DeliveryStats>,
    senders: Vec<Arc<Sender>>,
}

impl Experiment {
    /// Build the transport and endpoints and connect every sender to every
    /// receiver
    pub fn new(config: ExperimentConfig) -> ExperimentResult<Self> {
        config.validate()?;

        let transport = Arc::new(match config.seed {
            Some(seed) => Transport::with_seed(&config.protocol, seed)?,
            None => Transport::new(&config.protocol)?,
        });
        let ids = Arc::new(IdGenerator::new(config.protocol.max_message_id));
        let stats = Arc::new(DeliveryStats::new());

        let receivers: Vec<Arc<Receiver>> = config
            .receivers
            .iter()
            .map(|address| Arc::new(Receiver::from_config(address.as_str(), &config.protocol)))
            .collect();

        let senders: Vec<Arc<Sender>> = config
            .senders
            .iter()
            .map(|address| {
                Sender::new(
                    address.as_str(),
                    config.protocol.clone(),
                    Arc::clone(&ids),
                    Arc::clone(&stats),
                )
                .map(Arc::new)
            })
            .collect::<Result<_, _>>()?;

        for sender in &senders {
            for receiver in &receivers {
                sender.connect(receiver.as_ref());
            }
            transport.register(sender.clone());
        }
        for receiver in receivers {
            transport.register(receiver);
        }

        Ok(Self {
            config,
            transport,
            stats,
            senders,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Run the senders for the configured duration and report the counters
    ///
    /// Messages still awaiting confirmation when time is up are neither
    /// successes nor failures.
    pub async fn run(self) -> ExperimentReport {
        let protocol = &self.config.protocol;
        info!(
            error_chance = protocol.error_chance,
            fail_chance = protocol.fail_chance,
            duration_secs = self.config.duration_secs,
            senders = self.senders.len(),
            receivers = self.config.receivers.len(),
            "Starting experiment"
        );

        let mut tasks = JoinSet::new();
        for sender in &self.senders {
            tasks.spawn(Arc::clone(sender).run(Arc::clone(&self.transport)));
        }

        tokio::time::sleep(self.config.duration()).await;

        let report = ExperimentReport {
            error_chance: protocol.error_chance,
            fail_chance: protocol.fail_chance,
            delivery: self.stats.snapshot(),
            transport: self.transport.stats().snapshot(),
        };
        tasks.shutdown().await;

        info!(
            sent = report.delivery.sent,
            successes = report.delivery.successes,
            failures = report.delivery.failures,
            "Experiment finished"
        );
        report
    }
}
