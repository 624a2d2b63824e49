//! # In-Memory Broker
//!
//! An in-process stand-in for an AMQP 0-9-1 broker.
//!
//! Suitable for tests and single-process development; multiplayer games use
//! [`crate::amqp::AmqpConnection`] against a real broker.
//!
//! ## Modelled semantics
//!
//! - Exchanges are provisioned up front (`with_exchanges`); publishing to an
//!   unknown exchange fails with NOT_FOUND and closes the channel.
//! - Queue redeclaration must match the existing lifetime, otherwise
//!   PRECONDITION_FAILED closes the channel.
//! - Exclusive queues are locked to their declaring connection and removed
//!   when it closes; auto-delete queues are removed when their last
//!   consumer goes away.
//! - Delivery tags are per channel. Unacknowledged deliveries are requeued
//!   with `redelivered = true` when their channel closes.
//! - Consumers of one queue are served round-robin.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ExchangeDefinition, ExchangeKind, QueueLifetime};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::broker::{
    routing_key_matches, BrokerChannel, BrokerConnection, Delivery, DeliveryAcker,
    DeliveryStream, Envelope, OutboundMessage, QueueInfo,
};
use crate::errors::BrokerError;

type Shared = Arc<Mutex<BrokerState>>;
type ConnectionId = u64;
type ChannelId = u64;

#[derive(Debug, Clone)]
struct StoredMessage {
    exchange: String,
    routing_key: String,
    body: Vec<u8>,
    content_type: Option<String>,
    redelivered: bool,
}

struct Consumer {
    channel: ChannelId,
    sender: mpsc::UnboundedSender<Result<Delivery, BrokerError>>,
}

struct QueueState {
    lifetime: QueueLifetime,
    owner: Option<ConnectionId>,
    ready: VecDeque<StoredMessage>,
    consumers: Vec<Consumer>,
    next_consumer: usize,
    had_consumer: bool,
}

impl QueueState {
    fn info(&self, name: &str) -> QueueInfo {
        QueueInfo {
            name: name.to_string(),
            message_count: self.ready.len() as u32,
            consumer_count: self.consumers.len() as u32,
        }
    }

    fn abandoned(&self) -> bool {
        self.lifetime.auto_delete() && self.had_consumer && self.consumers.is_empty()
    }
}

struct ChannelState {
    connection: ConnectionId,
    next_delivery_tag: u64,
    /// delivery tag -> (queue, message)
    unacked: HashMap<u64, (String, StoredMessage)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    queue: String,
    exchange: String,
    routing_key: String,
}

#[derive(Default)]
struct BrokerState {
    exchanges: HashMap<String, ExchangeKind>,
    queues: HashMap<String, QueueState>,
    bindings: Vec<Binding>,
    connections: HashSet<ConnectionId>,
    channels: HashMap<ChannelId, ChannelState>,
    next_id: u64,
}

impl BrokerState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn channel_connection(&self, channel: ChannelId) -> Result<ConnectionId, BrokerError> {
        self.channels
            .get(&channel)
            .map(|c| c.connection)
            .ok_or(BrokerError::ChannelClosed)
    }

    /// Fail with `err` and close the channel, as a channel-level AMQP
    /// exception does.
    fn channel_exception<T>(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        err: BrokerError,
    ) -> Result<T, BrokerError> {
        debug!(channel, error = %err, "Channel exception");
        self.close_channel(shared, channel);
        Err(err)
    }

    fn locked_by_other(&self, queue: &str, connection: ConnectionId) -> bool {
        self.queues
            .get(queue)
            .and_then(|q| q.owner)
            .is_some_and(|owner| owner != connection)
    }

    fn declare_queue(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        name: &str,
        lifetime: QueueLifetime,
    ) -> Result<QueueInfo, BrokerError> {
        let connection = self.channel_connection(channel)?;
        let name = if name.is_empty() {
            format!("amq.gen-{}", Uuid::new_v4().simple())
        } else {
            name.to_string()
        };

        if let Some((current, info)) = self.queues.get(&name).map(|q| (q.lifetime, q.info(&name))) {
            if self.locked_by_other(&name, connection) {
                let err = BrokerError::ResourceLocked(format!(
                    "cannot obtain exclusive access to locked queue '{name}'"
                ));
                return self.channel_exception(shared, channel, err);
            }
            if current != lifetime {
                let err = BrokerError::PreconditionFailed(format!(
                    "inequivalent arguments for queue '{name}': received {lifetime}, current {current}"
                ));
                return self.channel_exception(shared, channel, err);
            }
            return Ok(info);
        }

        let queue = QueueState {
            lifetime,
            owner: lifetime.exclusive().then_some(connection),
            ready: VecDeque::new(),
            consumers: Vec::new(),
            next_consumer: 0,
            had_consumer: false,
        };
        let info = queue.info(&name);
        self.queues.insert(name.clone(), queue);
        trace!(queue = %name, %lifetime, "Queue declared");
        Ok(info)
    }

    fn bind_queue(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        let connection = self.channel_connection(channel)?;
        if !self.queues.contains_key(queue) {
            let err = BrokerError::NotFound(format!("no queue '{queue}'"));
            return self.channel_exception(shared, channel, err);
        }
        if self.locked_by_other(queue, connection) {
            let err = BrokerError::ResourceLocked(format!(
                "cannot obtain exclusive access to locked queue '{queue}'"
            ));
            return self.channel_exception(shared, channel, err);
        }
        if !self.exchanges.contains_key(exchange) {
            let err = BrokerError::NotFound(format!("no exchange '{exchange}'"));
            return self.channel_exception(shared, channel, err);
        }

        let binding = Binding {
            queue: queue.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
        Ok(())
    }

    fn publish(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError> {
        self.channel_connection(channel)?;
        let Some(&kind) = self.exchanges.get(exchange) else {
            let err = BrokerError::NotFound(format!("no exchange '{exchange}'"));
            return self.channel_exception(shared, channel, err);
        };

        let mut targets: Vec<String> = self
            .bindings
            .iter()
            .filter(|b| b.exchange == exchange)
            .filter(|b| routing_key_matches(kind, &b.routing_key, routing_key))
            .map(|b| b.queue.clone())
            .collect();
        targets.sort();
        targets.dedup();

        if targets.is_empty() {
            trace!(exchange, routing_key, "Message unroutable, dropped");
        }

        for name in targets {
            if let Some(queue) = self.queues.get_mut(&name) {
                queue.ready.push_back(StoredMessage {
                    exchange: exchange.to_string(),
                    routing_key: routing_key.to_string(),
                    body: message.body.clone(),
                    content_type: Some(message.content_type.clone()),
                    redelivered: false,
                });
            }
            self.dispatch(shared, &name);
        }
        Ok(())
    }

    fn consume(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        queue: &str,
    ) -> Result<mpsc::UnboundedReceiver<Result<Delivery, BrokerError>>, BrokerError> {
        let connection = self.channel_connection(channel)?;
        if !self.queues.contains_key(queue) {
            let err = BrokerError::NotFound(format!("no queue '{queue}'"));
            return self.channel_exception(shared, channel, err);
        }
        if self.locked_by_other(queue, connection) {
            let err = BrokerError::ResourceLocked(format!(
                "cannot obtain exclusive access to locked queue '{queue}'"
            ));
            return self.channel_exception(shared, channel, err);
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        if let Some(state) = self.queues.get_mut(queue) {
            state.consumers.push(Consumer { channel, sender });
            state.had_consumer = true;
        }
        self.dispatch(shared, queue);
        Ok(receiver)
    }

    /// Hand ready messages to consumers until one side runs out.
    fn dispatch(&mut self, shared: &Shared, queue_name: &str) {
        let Some(queue) = self.queues.get_mut(queue_name) else {
            return;
        };

        while !queue.ready.is_empty() && !queue.consumers.is_empty() {
            let idx = queue.next_consumer % queue.consumers.len();
            let channel_id = queue.consumers[idx].channel;
            let Some(channel) = self.channels.get_mut(&channel_id) else {
                queue.consumers.remove(idx);
                continue;
            };
            let Some(message) = queue.ready.pop_front() else {
                break;
            };

            channel.next_delivery_tag += 1;
            let delivery_tag = channel.next_delivery_tag;
            let envelope = Envelope {
                body: message.body.clone(),
                content_type: message.content_type.clone(),
                delivery_tag,
                exchange: message.exchange.clone(),
                routing_key: message.routing_key.clone(),
                redelivered: message.redelivered,
            };
            let acker = Arc::new(ChannelAcker {
                shared: Arc::clone(shared),
                channel: channel_id,
            });

            if queue.consumers[idx]
                .sender
                .send(Ok(Delivery::new(envelope, acker)))
                .is_err()
            {
                // Consumer stream was dropped; keep the message for the others.
                queue.ready.push_front(message);
                queue.consumers.remove(idx);
                continue;
            }

            channel
                .unacked
                .insert(delivery_tag, (queue_name.to_string(), message));
            queue.next_consumer = idx + 1;
        }

        if queue.abandoned() {
            self.delete_queue(queue_name);
        }
    }

    fn ack(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        delivery_tag: u64,
    ) -> Result<(), BrokerError> {
        let state = self
            .channels
            .get_mut(&channel)
            .ok_or(BrokerError::ChannelClosed)?;
        if state.unacked.remove(&delivery_tag).is_none() {
            let err = BrokerError::PreconditionFailed(format!("unknown delivery tag {delivery_tag}"));
            return self.channel_exception(shared, channel, err);
        }
        Ok(())
    }

    fn nack(
        &mut self,
        shared: &Shared,
        channel: ChannelId,
        delivery_tag: u64,
        requeue: bool,
    ) -> Result<(), BrokerError> {
        let state = self
            .channels
            .get_mut(&channel)
            .ok_or(BrokerError::ChannelClosed)?;
        let Some((queue_name, mut message)) = state.unacked.remove(&delivery_tag) else {
            let err = BrokerError::PreconditionFailed(format!("unknown delivery tag {delivery_tag}"));
            return self.channel_exception(shared, channel, err);
        };

        if requeue {
            if let Some(queue) = self.queues.get_mut(&queue_name) {
                message.redelivered = true;
                queue.ready.push_front(message);
            }
            self.dispatch(shared, &queue_name);
        }
        Ok(())
    }

    fn close_channel(&mut self, shared: &Shared, channel_id: ChannelId) {
        let Some(channel) = self.channels.remove(&channel_id) else {
            return;
        };

        let mut touched = Vec::new();
        for (name, queue) in self.queues.iter_mut() {
            let before = queue.consumers.len();
            queue.consumers.retain(|c| c.channel != channel_id);
            if queue.consumers.len() != before {
                touched.push(name.clone());
            }
        }

        let mut unacked: Vec<_> = channel.unacked.into_iter().collect();
        unacked.sort_by_key(|(tag, _)| *tag);
        for (_, (queue_name, mut message)) in unacked.into_iter().rev() {
            if let Some(queue) = self.queues.get_mut(&queue_name) {
                message.redelivered = true;
                queue.ready.push_front(message);
            }
            touched.push(queue_name);
        }

        touched.sort();
        touched.dedup();
        for name in touched {
            let abandoned = self.queues.get(&name).is_some_and(QueueState::abandoned);
            if abandoned {
                self.delete_queue(&name);
            } else {
                self.dispatch(shared, &name);
            }
        }
        trace!(channel = channel_id, "Channel closed");
    }

    fn close_connection(&mut self, shared: &Shared, connection: ConnectionId) {
        if !self.connections.remove(&connection) {
            return;
        }

        let channels: Vec<ChannelId> = self
            .channels
            .iter()
            .filter(|(_, c)| c.connection == connection)
            .map(|(id, _)| *id)
            .collect();
        for channel in channels {
            self.close_channel(shared, channel);
        }

        let exclusive: Vec<String> = self
            .queues
            .iter()
            .filter(|(_, q)| q.owner == Some(connection))
            .map(|(name, _)| name.clone())
            .collect();
        for name in exclusive {
            self.delete_queue(&name);
        }
        debug!(connection, "Connection closed");
    }

    fn delete_queue(&mut self, name: &str) {
        if self.queues.remove(name).is_some() {
            self.bindings.retain(|b| b.queue != name);
            debug!(queue = %name, "Queue deleted");
        }
    }
}

/// An in-process broker shared by every connection made from it.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    shared: Shared,
}

impl InMemoryBroker {
    /// A broker with no exchanges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker with `exchanges` already provisioned.
    #[must_use]
    pub fn with_exchanges(exchanges: &[ExchangeDefinition]) -> Self {
        let broker = Self::new();
        for exchange in exchanges {
            broker.declare_exchange(exchange.name, exchange.kind);
        }
        broker
    }

    /// Provision an exchange, as a broker administrator would.
    pub fn declare_exchange(&self, name: &str, kind: ExchangeKind) {
        self.shared.lock().exchanges.insert(name.to_string(), kind);
    }

    /// Open a new connection.
    #[must_use]
    pub fn connect(&self) -> InMemoryConnection {
        let mut state = self.shared.lock();
        let id = state.next_id();
        state.connections.insert(id);
        InMemoryConnection {
            id,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Lifetime of `queue`, or `None` if it does not exist.
    pub fn queue_lifetime(&self, queue: &str) -> Option<QueueLifetime> {
        self.shared.lock().queues.get(queue).map(|q| q.lifetime)
    }

    pub fn is_bound(&self, queue: &str, exchange: &str, routing_key: &str) -> bool {
        self.shared
            .lock()
            .bindings
            .iter()
            .any(|b| b.queue == queue && b.exchange == exchange && b.routing_key == routing_key)
    }

    /// Messages waiting in `queue` (not counting unacknowledged deliveries).
    pub fn ready_count(&self, queue: &str) -> Option<usize> {
        self.shared.lock().queues.get(queue).map(|q| q.ready.len())
    }

    pub fn consumer_count(&self, queue: &str) -> Option<usize> {
        self.shared.lock().queues.get(queue).map(|q| q.consumers.len())
    }
}

/// A connection to an [`InMemoryBroker`].
pub struct InMemoryConnection {
    id: ConnectionId,
    shared: Shared,
}

#[async_trait]
impl BrokerConnection for InMemoryConnection {
    async fn open_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError> {
        let mut state = self.shared.lock();
        if !state.connections.contains(&self.id) {
            return Err(BrokerError::ConnectionClosed);
        }
        let id = state.next_id();
        state.channels.insert(
            id,
            ChannelState {
                connection: self.id,
                next_delivery_tag: 0,
                unacked: HashMap::new(),
            },
        );
        Ok(Arc::new(InMemoryChannel {
            id,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.shared.lock().close_connection(&self.shared, self.id);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.lock().connections.contains(&self.id)
    }
}

/// A channel on an [`InMemoryConnection`].
pub struct InMemoryChannel {
    id: ChannelId,
    shared: Shared,
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn declare_queue(
        &self,
        name: &str,
        lifetime: QueueLifetime,
    ) -> Result<QueueInfo, BrokerError> {
        self.shared
            .lock()
            .declare_queue(&self.shared, self.id, name, lifetime)
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.shared
            .lock()
            .bind_queue(&self.shared, self.id, queue, exchange, routing_key)
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutboundMessage,
    ) -> Result<(), BrokerError> {
        self.shared
            .lock()
            .publish(&self.shared, self.id, exchange, routing_key, message)
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        let receiver = self.shared.lock().consume(&self.shared, self.id, queue)?;
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.shared.lock().close_channel(&self.shared, self.id);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.lock().channels.contains_key(&self.id)
    }
}

struct ChannelAcker {
    shared: Shared,
    channel: ChannelId,
}

#[async_trait]
impl DeliveryAcker for ChannelAcker {
    async fn ack(&self, delivery_tag: u64) -> Result<(), BrokerError> {
        self.shared
            .lock()
            .ack(&self.shared, self.channel, delivery_tag)
    }

    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), BrokerError> {
        self.shared
            .lock()
            .nack(&self.shared, self.channel, delivery_tag, requeue)
    }
}
