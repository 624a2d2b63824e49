//! # Peril Game - State Coordinator
//!
//! The client-side game model: stationed units, armies, other players'
//! visible units and the server-controlled pause flag.
//!
//! ## Module Structure
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  service.rs - GameCoordinator (one RwLock, methods only)  │
//! └───────────────────────────────────────────────────────────┘
//!                          ↓ uses ↓
//! ┌───────────────────────────────────────────────────────────┐
//! │  domain/ - GameState, GameMap, UnitOrder, StatusReport    │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Entry points
//!
//! | Caller | Method | Effect |
//! |--------|--------|--------|
//! | pause subscription | `handle_pause` | sets the pause flag |
//! | army-move subscription | `handle_move` | records other players' units |
//! | command loop | `command_spawn` | stations new units |
//! | command loop | `command_move` | dispatches units, returns the move |
//! | command loop | `command_status` | read-only report |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod service;

pub use domain::{
    CommandError, GameMap, GameState, MapError, MoveOutcome, StatusReport, UnitOrder,
    DEFAULT_REGIONS, MAX_UNITS_PER_ORDER, MOVE_USAGE, SPAWN_USAGE,
};
pub use service::GameCoordinator;
