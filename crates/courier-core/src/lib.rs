//! # Courier Core
//!
//! Send-and-confirm messaging over a deliberately unreliable, simulated
//! transport.
//!
//! ## Overview
//!
//! - [`Message`]: data or confirmation message; confirmations carry an expiry
//! - [`IdGenerator`]: shared wrapping id counter
//! - [`Transport`]: address registry plus per-hop delay, corruption and loss
//! - [`Endpoint`]: what the transport delivers to
//! - [`Sender`]: periodically originates messages and retries until confirmed
//! - [`Receiver`]: acknowledges every well-formed data message
//! - [`DeliveryStats`]: success/failure sink read by the experiment driver
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courier_core::*;
//!
//! let config = ProtocolConfig::default();
//! let transport = Arc::new(Transport::new(&config)?);
//! let ids = Arc::new(IdGenerator::new(config.max_message_id));
//! let stats = Arc::new(DeliveryStats::new());
//!
//! let sender = Arc::new(Sender::new("a", config.clone(), ids, stats.clone())?);
//! let receiver = Arc::new(Receiver::from_config("b", &config));
//! sender.connect(receiver.as_ref());
//! transport.register(sender.clone());
//! transport.register(receiver);
//!
//! let task = sender.spawn(transport);
//! tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//! task.abort();
//! println!("{:?}", stats.snapshot());
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod id;
pub mod message;
pub mod pending;
pub mod receiver;
pub mod sender;
pub mod stats;
pub mod transport;

pub use config::ProtocolConfig;
pub use endpoint::{Address, Endpoint, PeerSet};
pub use error::*;
pub use id::IdGenerator;
pub use message::{CONFIRMATION_CONTENT, Message, MessageId};
pub use pending::{PendingConfirmations, PendingTicket};
pub use receiver::Receiver;
pub use sender::{DeliveryState, Sender};
pub use stats::{DeliverySnapshot, DeliveryStats};
pub use transport::{Transport, TransportSnapshot, TransportStats};
