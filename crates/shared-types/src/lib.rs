//! # Shared Types Crate
//!
//! This crate contains the game payloads that travel over the broker and the
//! topology registry every publisher and subscriber routes by.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: exchange names, routing-key prefixes and
//!   queue lifetimes are defined once in [`routing`]; no other crate
//!   hand-authors those strings.
//! - **Wire Compatibility**: payload field names are camelCase on the wire
//!   (`isPaused`, `toRegion`) so any other client speaking the same JSON can
//!   join a game.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod entities;
pub mod routing;

pub use entities::*;
pub use routing::{ExchangeDefinition, ExchangeKind, QueueLifetime};
