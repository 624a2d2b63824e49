//! # Broker Ports
//!
//! The primitives the bus needs from an AMQP 0-9-1 broker client.
//!
//! ```text
//! BrokerConnection ──open_channel()──→ BrokerChannel
//!                                        │
//!            declare_queue / bind_queue / publish / consume
//!                                        │
//!                                        ↓
//!                                  DeliveryStream ──→ Delivery ──ack()──→ broker
//! ```
//!
//! Implementations:
//! - [`crate::amqp::AmqpConnection`]: a real broker via `lapin`
//! - [`crate::memory::InMemoryBroker`]: an in-process broker for tests

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{ExchangeKind, QueueLifetime};
use tokio_stream::Stream;

use crate::errors::BrokerError;

/// Result of a successful queue declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueInfo {
    /// Queue name (server-generated if the declaration used an empty name).
    pub name: String,
    /// Messages ready for delivery at declaration time.
    pub message_count: u32,
    /// Active consumers at declaration time.
    pub consumer_count: u32,
}

/// A message about to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// A message as delivered to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    /// Channel-scoped tag used to acknowledge this delivery.
    pub delivery_tag: u64,
    pub exchange: String,
    pub routing_key: String,
    /// Set when the broker has delivered this message before.
    pub redelivered: bool,
}

/// Settles deliveries on the channel they arrived on.
#[async_trait]
pub trait DeliveryAcker: Send + Sync {
    /// Acknowledge a single delivery.
    async fn ack(&self, delivery_tag: u64) -> Result<(), BrokerError>;

    /// Reject a single delivery, optionally returning it to its queue.
    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), BrokerError>;
}

/// A delivered message owned by the consumer until settled.
pub struct Delivery {
    pub envelope: Envelope,
    acker: Arc<dyn DeliveryAcker>,
}

impl Delivery {
    pub fn new(envelope: Envelope, acker: Arc<dyn DeliveryAcker>) -> Self {
        Self { envelope, acker }
    }

    /// Acknowledge this message only (`multiple = false`).
    pub async fn ack(&self) -> Result<(), BrokerError> {
        self.acker.ack(self.envelope.delivery_tag).await
    }

    /// Reject this message only.
    pub async fn nack(&self, requeue: bool) -> Result<(), BrokerError> {
        self.acker.nack(self.envelope.delivery_tag, requeue).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}

/// Deliveries from one consumer. Ends when the channel or connection closes.
pub type DeliveryStream = Pin<Box<dyn Stream<Item = Result<Delivery, BrokerError>> + Send>>;

/// A lightweight virtual connection multiplexed over a [`BrokerConnection`].
///
/// A channel is not shared between independent consumers; every
/// subscription opens its own.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declare a queue with the flags implied by `lifetime`.
    ///
    /// Redeclaring an existing queue with different flags must fail.
    async fn declare_queue(
        &self,
        name: &str,
        lifetime: QueueLifetime,
    ) -> Result<QueueInfo, BrokerError>;

    /// Bind `queue` to `exchange` under `routing_key`.
    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError>;

    /// Publish without waiting for a broker confirmation.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError>;

    /// Start a manually acknowledged consumer on `queue`.
    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError>;

    /// Close the channel. Unacknowledged deliveries return to their queues.
    async fn close(&self) -> Result<(), BrokerError>;

    fn is_open(&self) -> bool;
}

/// One physical connection to the broker.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    async fn open_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError>;

    /// Close the connection and every channel opened on it.
    async fn close(&self) -> Result<(), BrokerError>;

    fn is_open(&self) -> bool;
}

/// Whether a message published under `key` is routed through a binding
/// with `pattern` on an exchange of `kind`.
pub fn routing_key_matches(kind: ExchangeKind, pattern: &str, key: &str) -> bool {
    match kind {
        ExchangeKind::Direct => pattern == key,
        ExchangeKind::Topic => {
            let pattern: Vec<&str> = pattern.split('.').collect();
            let key: Vec<&str> = key.split('.').collect();
            topic_matches(&pattern, &key)
        }
    }
}

fn topic_matches(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| topic_matches(rest, &key[skip..])),
        Some((&"*", rest)) => !key.is_empty() && topic_matches(rest, &key[1..]),
        Some((word, rest)) => key.first() == Some(word) && topic_matches(rest, &key[1..]),
    }
}
