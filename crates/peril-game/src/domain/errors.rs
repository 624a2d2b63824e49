//! Game error types.

use shared_types::UnitRank;
use thiserror::Error;

/// A rejected player command. The game state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Wrong number of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error("unknown unit type '{0}' (expected infantry, cavalry or artillery)")]
    UnknownUnitType(String),

    /// Count is not a positive integer.
    #[error("invalid unit count '{0}'")]
    InvalidCount(String),

    #[error("not enough {rank} in {region}: requested {requested}, available {available}")]
    InsufficientUnits {
        region: String,
        rank: UnitRank,
        requested: usize,
        available: usize,
    },

    /// Moves are refused while the server has paused the game.
    #[error("the game is paused")]
    Paused,
}

/// An unusable region list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("a map needs at least one region")]
    Empty,

    #[error("region '{0}' is listed twice")]
    DuplicateRegion(String),

    #[error("region names must be non-empty and contain no whitespace: '{0}'")]
    InvalidRegion(String),
}
