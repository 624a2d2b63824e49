//! # Bus Errors
//!
//! One error type per stage of the publish/subscribe pipeline:
//!
//! - [`BrokerError`]: a raw failure reported by the broker or its client
//! - [`ConnectionError`]: the broker could not be reached
//! - [`TopologyError`]: a queue declaration or binding was rejected
//! - [`PublishError`]: encoding or broker rejection while publishing
//! - [`CodecError`]: a payload could not be encoded or decoded
//! - [`SubscribeError`]: subscription setup failed

use thiserror::Error;

/// A failure reported by the broker or the broker client.
///
/// Variants mirror the AMQP reply codes the game can run into.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The channel is closed (explicitly, or by a channel-level error).
    #[error("channel closed")]
    ChannelClosed,

    /// The underlying connection is closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// A redeclaration did not match the existing entity (406).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// An exclusive queue is owned by another connection (405).
    #[error("resource locked: {0}")]
    ResourceLocked(String),

    /// An exchange or queue does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other protocol-level rejection.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport failure.
    #[error("io error: {0}")]
    Io(String),
}

/// The broker at `uri` could not be reached. Fatal at startup.
#[derive(Debug, Error)]
#[error("could not connect to broker at {uri}: {source}")]
pub struct ConnectionError {
    pub uri: String,
    #[source]
    pub source: BrokerError,
}

/// Declaring or binding a queue was rejected.
///
/// Fatal to the subscription being set up; never retried.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("could not open channel: {0}")]
    Channel(#[source] BrokerError),

    #[error("could not declare queue {queue}: {source}")]
    Declare {
        queue: String,
        #[source]
        source: BrokerError,
    },

    #[error("could not bind queue {queue} to {exchange} with key {routing_key}: {source}")]
    Bind {
        queue: String,
        exchange: String,
        routing_key: String,
        #[source]
        source: BrokerError,
    },
}

/// A payload could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("could not encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not decode payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Publishing failed. The caller decides whether to retry.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Encode(#[from] CodecError),

    #[error("broker rejected publish to {exchange} ({routing_key}): {source}")]
    Broker {
        exchange: String,
        routing_key: String,
        #[source]
        source: BrokerError,
    },
}

/// Subscription setup failed; steady-state failures never surface here.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("could not start consuming from {queue}: {source}")]
    Consume {
        queue: String,
        #[source]
        source: BrokerError,
    },
}

/// Error returned by message handlers. Logged, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
