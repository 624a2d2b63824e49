//! # Channel/Binding Manager
//!
//! Opens a dedicated channel, declares a queue with a lifetime policy and
//! binds it to an exchange.

use std::sync::Arc;

use shared_types::QueueLifetime;
use tracing::{debug, warn};

use crate::broker::{BrokerChannel, BrokerConnection, QueueInfo};
use crate::errors::TopologyError;

/// Where a subscription's queue lives and what it listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    /// Pre-existing exchange to bind to.
    pub exchange: String,
    /// Queue name. Every party referencing it must use the same lifetime.
    pub queue: String,
    /// Binding pattern; may contain `*`/`#` on topic exchanges.
    pub routing_key: String,
    pub lifetime: QueueLifetime,
}

impl QueueBinding {
    pub fn new(
        exchange: impl Into<String>,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
        lifetime: QueueLifetime,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            queue: queue.into(),
            routing_key: routing_key.into(),
            lifetime,
        }
    }

    /// A per-client queue deleted once its consumer disconnects.
    pub fn transient(
        exchange: impl Into<String>,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self::new(exchange, queue, routing_key, QueueLifetime::Transient)
    }

    /// A shared queue that survives broker restarts.
    pub fn durable(
        exchange: impl Into<String>,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self::new(exchange, queue, routing_key, QueueLifetime::Durable)
    }
}

/// Open a fresh channel, declare `binding.queue` and bind it.
///
/// The returned channel belongs to the caller; a failed declaration or
/// binding closes it and is reported as a [`TopologyError`].
pub async fn declare_and_bind(
    connection: &dyn BrokerConnection,
    binding: &QueueBinding,
) -> Result<(Arc<dyn BrokerChannel>, QueueInfo), TopologyError> {
    let channel = connection
        .open_channel()
        .await
        .map_err(TopologyError::Channel)?;

    let queue = match channel.declare_queue(&binding.queue, binding.lifetime).await {
        Ok(queue) => queue,
        Err(source) => {
            discard(channel.as_ref()).await;
            return Err(TopologyError::Declare {
                queue: binding.queue.clone(),
                source,
            });
        }
    };

    if let Err(source) = channel
        .bind_queue(&queue.name, &binding.exchange, &binding.routing_key)
        .await
    {
        discard(channel.as_ref()).await;
        return Err(TopologyError::Bind {
            queue: queue.name,
            exchange: binding.exchange.clone(),
            routing_key: binding.routing_key.clone(),
            source,
        });
    }

    debug!(
        queue = %queue.name,
        exchange = %binding.exchange,
        routing_key = %binding.routing_key,
        lifetime = %binding.lifetime,
        "Queue declared and bound"
    );

    Ok((channel, queue))
}

/// Close a channel that failed setup, logging rather than returning errors.
pub(crate) async fn discard(channel: &dyn BrokerChannel) {
    if !channel.is_open() {
        return;
    }
    if let Err(e) = channel.close().await {
        warn!(error = %e, "Failed to close channel after setup error");
    }
}
