//! # Shared Bus - Typed Messaging over AMQP
//!
//! Every Peril process talks to every other one through a broker. This crate
//! is the only code that touches it.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────┐  publish()   ┌───────────────┐  subscribe()  ┌──────────────┐
//! │  Publisher   │ ───────────→ │   Exchange    │ ────────────→ │  Subscriber  │
//! │  (encode)    │              │ direct/topic  │   queue       │ (decode,ack) │
//! └──────────────┘              └───────────────┘               └──────────────┘
//!        │                              ↑                              │
//!        └──────── BrokerChannel ───────┴──────── BrokerChannel ───────┘
//! ```
//!
//! - [`codec`]: domain value <-> bytes
//! - [`topology`]: `declare_and_bind`, one channel per queue
//! - [`publisher`]: encode and publish, no confirms, no retries
//! - [`subscriber`]: one delivery task per subscription, manual ack
//! - [`broker`]: the connection/channel ports, implemented by [`amqp`] and
//!   [`memory`]
//!
//! ## Delivery guarantees
//!
//! At-least-once for consumers: a message is acknowledged only after its
//! handler returns. Undecodable messages are logged and acknowledged so a
//! single bad payload cannot wedge a queue.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod amqp;
pub mod broker;
pub mod codec;
pub mod errors;
pub mod memory;
pub mod publisher;
pub mod subscriber;
pub mod topology;

pub use amqp::{AmqpChannel, AmqpConnection};
pub use broker::{
    BrokerChannel, BrokerConnection, Delivery, DeliveryStream, Envelope, OutboundMessage,
    QueueInfo,
};
pub use codec::{JsonCodec, MessageCodec, CONTENT_TYPE_JSON};
pub use errors::{
    BrokerError, CodecError, ConnectionError, HandlerError, PublishError, SubscribeError,
    TopologyError,
};
pub use memory::{InMemoryBroker, InMemoryChannel, InMemoryConnection};
pub use publisher::{publish, publish_json, Publisher};
pub use subscriber::{subscribe, subscribe_json, Subscription, SubscriptionRegistry};
pub use topology::{declare_and_bind, QueueBinding};
