//! # Domain Layer - Game Rules
//!
//! Pure game logic with no locking and no I/O.
//!
//! - `state`: `GameState`, spawn/dispatch/merge
//! - `commands`: `<region> <unitType> <count>` argument parsing
//! - `map`: valid regions
//! - `status`: `StatusReport`
//! - `errors`: `CommandError`, `MapError`

pub mod commands;
pub mod errors;
pub mod map;
pub mod state;
pub mod status;

pub use commands::*;
pub use errors::*;
pub use map::*;
pub use state::*;
pub use status::*;
