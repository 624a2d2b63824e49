//! # Typed Subscriber
//!
//! Declares and binds a queue, starts a manually acknowledged consumer and
//! runs one delivery task per subscription.
//!
//! ## Delivery loop
//!
//! ```text
//! delivery ──decode──→ handler(value) ──→ ack
//!              │              │
//!              └─ error ──────┴─ error ──→ log, ack
//! ```
//!
//! A message is acknowledged only after the handler returns, so a process
//! that dies mid-handler leaves it for redelivery. Undecodable messages and
//! handler failures are logged and acknowledged; they never stop the loop.
//! The task ends when the delivery stream closes (channel or connection
//! closed).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::broker::{BrokerChannel, BrokerConnection, DeliveryStream, Envelope};
use crate::codec::{JsonCodec, MessageCodec};
use crate::errors::{HandlerError, SubscribeError};
use crate::topology::{declare_and_bind, discard, QueueBinding};

/// A running subscription.
///
/// Owns its channel; closing the channel ends the delivery task.
pub struct Subscription {
    queue: String,
    channel: Arc<dyn BrokerChannel>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Name of the consumed queue.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Whether the delivery task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the channel and wait for the delivery task to drain.
    pub async fn close(self) {
        if self.channel.is_open() {
            if let Err(e) = self.channel.close().await {
                warn!(queue = %self.queue, error = %e, "Failed to close subscription channel");
            }
        }
        if let Err(e) = self.task.await {
            error!(queue = %self.queue, error = %e, "Delivery task panicked");
        }
        debug!(queue = %self.queue, "Subscription closed");
    }
}

/// Subscribe `handler` to `binding`, decoding bodies with `codec`.
///
/// Only setup can fail: declaring, binding or starting the consumer.
pub async fn subscribe<T, C, F>(
    connection: &dyn BrokerConnection,
    binding: &QueueBinding,
    codec: C,
    handler: F,
) -> Result<Subscription, SubscribeError>
where
    T: DeserializeOwned + Send + 'static,
    C: MessageCodec,
    F: Fn(T) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    let (channel, queue) = declare_and_bind(connection, binding).await?;

    let deliveries = match channel.consume(&queue.name).await {
        Ok(deliveries) => deliveries,
        Err(source) => {
            discard(channel.as_ref()).await;
            return Err(SubscribeError::Consume {
                queue: queue.name,
                source,
            });
        }
    };

    let task = tokio::spawn(run_deliveries(
        queue.name.clone(),
        deliveries,
        codec,
        handler,
    ));

    info!(
        queue = %queue.name,
        exchange = %binding.exchange,
        routing_key = %binding.routing_key,
        lifetime = %binding.lifetime,
        "Subscribed"
    );

    Ok(Subscription {
        queue: queue.name,
        channel,
        task,
    })
}

/// [`subscribe`] with JSON bodies.
pub async fn subscribe_json<T, F>(
    connection: &dyn BrokerConnection,
    binding: &QueueBinding,
    handler: F,
) -> Result<Subscription, SubscribeError>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    subscribe(connection, binding, JsonCodec, handler).await
}

async fn run_deliveries<T, C, F>(queue: String, mut deliveries: DeliveryStream, codec: C, handler: F)
where
    T: DeserializeOwned,
    C: MessageCodec,
    F: Fn(T) -> Result<(), HandlerError>,
{
    while let Some(next) = deliveries.next().await {
        let delivery = match next {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(queue = %queue, error = %e, "Delivery stream error");
                continue;
            }
        };

        dispatch::<T, C, F>(&queue, &delivery.envelope, &codec, &handler);

        if let Err(e) = delivery.ack().await {
            warn!(
                queue = %queue,
                delivery_tag = delivery.envelope.delivery_tag,
                error = %e,
                "Failed to acknowledge delivery"
            );
        }
    }

    debug!(queue = %queue, "Delivery stream closed");
}

fn dispatch<T, C, F>(queue: &str, envelope: &Envelope, codec: &C, handler: &F)
where
    T: DeserializeOwned,
    C: MessageCodec,
    F: Fn(T) -> Result<(), HandlerError>,
{
    let value = match codec.decode::<T>(&envelope.body) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                queue,
                delivery_tag = envelope.delivery_tag,
                routing_key = %envelope.routing_key,
                content_type = envelope.content_type.as_deref().unwrap_or("-"),
                error = %e,
                "Discarding undecodable message"
            );
            return;
        }
    };

    if let Err(e) = handler(value) {
        error!(
            queue,
            delivery_tag = envelope.delivery_tag,
            routing_key = %envelope.routing_key,
            error = %e,
            "Message handler failed"
        );
    }
}

/// Active subscriptions of one process.
///
/// Subscriptions are closed in reverse registration order at shutdown.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Queues with a registered subscription, in registration order.
    pub fn queues(&self) -> Vec<&str> {
        self.subscriptions.iter().map(Subscription::queue).collect()
    }

    /// Close every subscription, newest first.
    pub async fn close_all(&mut self) {
        while let Some(subscription) = self.subscriptions.pop() {
            subscription.close().await;
        }
    }
}
