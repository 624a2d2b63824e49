//! # Peril Test Suite
//!
//! Cross-crate scenarios: real `GameClient`/`GameServer` instances talking
//! through an `InMemoryBroker`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # broker, clients, polling helper
//!     ├── pause_flow.rs   # server pause/resume reaching clients
//!     ├── army_moves.rs   # move broadcast, self-delivery, failed publish
//!     ├── game_log.rs     # durable game-log queue and log file
//!     └── topology.rs     # queue lifetime conflicts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p peril-tests
//! cargo test -p peril-tests integration::pause_flow::
//! ```

pub mod integration;
