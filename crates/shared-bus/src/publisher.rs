//! # Typed Publisher
//!
//! Encodes a domain value and publishes it to an exchange under a routing
//! key. No delivery confirmation is awaited and nothing is retried; the
//! caller decides what to do with a [`PublishError`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::broker::{BrokerChannel, OutboundMessage};
use crate::codec::{JsonCodec, MessageCodec};
use crate::errors::PublishError;

/// Encode `value` with `codec` and publish it.
pub async fn publish<T, C>(
    channel: &dyn BrokerChannel,
    codec: &C,
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<(), PublishError>
where
    T: Serialize + ?Sized,
    C: MessageCodec,
{
    let body = codec.encode(value)?;
    let message = OutboundMessage {
        body,
        content_type: codec.content_type().to_string(),
    };

    channel
        .publish(exchange, routing_key, message)
        .await
        .map_err(|source| {
            warn!(exchange, routing_key, error = %source, "Publish rejected");
            PublishError::Broker {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                source,
            }
        })?;

    debug!(exchange, routing_key, "Message published");
    Ok(())
}

/// Publish `value` as `application/json`.
pub async fn publish_json<T>(
    channel: &dyn BrokerChannel,
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<(), PublishError>
where
    T: Serialize + ?Sized,
{
    publish(channel, &JsonCodec, exchange, routing_key, value).await
}

/// A channel reserved for publishing.
///
/// Subscriptions each own their channel; a process publishes through one
/// of these instead.
pub struct Publisher<C = JsonCodec> {
    channel: Arc<dyn BrokerChannel>,
    codec: C,
    messages_published: AtomicU64,
}

impl Publisher<JsonCodec> {
    /// A JSON publisher on `channel`.
    #[must_use]
    pub fn json(channel: Arc<dyn BrokerChannel>) -> Self {
        Self::with_codec(channel, JsonCodec)
    }
}

impl<C: MessageCodec> Publisher<C> {
    #[must_use]
    pub fn with_codec(channel: Arc<dyn BrokerChannel>, codec: C) -> Self {
        Self {
            channel,
            codec,
            messages_published: AtomicU64::new(0),
        }
    }

    /// Encode and publish `value`.
    pub async fn publish<T>(
        &self,
        exchange: &str,
        routing_key: &str,
        value: &T,
    ) -> Result<(), PublishError>
    where
        T: Serialize + ?Sized,
    {
        publish(self.channel.as_ref(), &self.codec, exchange, routing_key, value).await?;
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Messages accepted by the broker client so far.
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    pub fn channel(&self) -> &Arc<dyn BrokerChannel> {
        &self.channel
    }
}
