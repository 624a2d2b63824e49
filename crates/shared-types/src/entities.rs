//! # Game Payloads
//!
//! Values exchanged as JSON message bodies between game processes.
//!
//! - **Control**: [`PlayingState`]
//! - **Per-player events**: [`ArmyMove`], [`GameLog`]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pause/resume control signal broadcast by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingState {
    /// Whether the game is currently paused.
    pub is_paused: bool,
}

impl PlayingState {
    /// The signal that pauses every client.
    pub const PAUSED: Self = Self { is_paused: true };
    /// The signal that resumes every client.
    pub const RESUMED: Self = Self { is_paused: false };
}

/// Identity of the player an event originated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerState {
    pub username: String,
}

impl PlayerState {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Unit type. Serialized lowercase (`"infantry"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRank {
    Infantry,
    Cavalry,
    Artillery,
}

impl UnitRank {
    /// Every rank, in display order.
    pub const ALL: [UnitRank; 3] = [UnitRank::Infantry, UnitRank::Cavalry, UnitRank::Artillery];

    pub fn as_str(self) -> &'static str {
        match self {
            UnitRank::Infantry => "infantry",
            UnitRank::Cavalry => "cavalry",
            UnitRank::Artillery => "artillery",
        }
    }
}

impl fmt::Display for UnitRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a unit type name is not one of [`UnitRank::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown unit type: {0}")]
pub struct UnknownUnitRank(pub String);

impl FromStr for UnitRank {
    type Err = UnknownUnitRank;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "infantry" => Ok(UnitRank::Infantry),
            "cavalry" => Ok(UnitRank::Cavalry),
            "artillery" => Ok(UnitRank::Artillery),
            _ => Err(UnknownUnitRank(s.to_string())),
        }
    }
}

/// A single unit on the map.
///
/// `id` is unique per owning player, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub id: u64,
    pub rank: UnitRank,
    pub region: String,
}

/// An army dispatched by a player, broadcast under `army-move.<username>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyMove {
    /// The player who issued the move.
    pub player: PlayerState,
    /// Destination region.
    pub to_region: String,
    /// Units travelling with the army.
    pub units: Vec<Unit>,
}

impl ArmyMove {
    /// Number of units of `rank` in this army.
    pub fn count_of(&self, rank: UnitRank) -> usize {
        self.units.iter().filter(|u| u.rank == rank).count()
    }
}

/// One line of shared game history, persisted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLog {
    pub current_time: DateTime<Utc>,
    pub message: String,
    pub username: String,
}

impl GameLog {
    /// Create a log entry stamped with the current time.
    pub fn now(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            current_time: Utc::now(),
            message: message.into(),
            username: username.into(),
        }
    }
}
