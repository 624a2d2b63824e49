//! # Topology Registry
//!
//! Exchange names, routing-key prefixes, queue names and queue lifetime
//! policies shared by every Peril process.
//!
//! ## Exchanges
//!
//! | Exchange | Kind | Used for |
//! |---|---|---|
//! | `direct-control` | direct | pause/resume broadcast |
//! | `topic-events` | topic | per-player army moves, game log |
//!
//! Exchanges are provisioned on the broker ahead of time and are only ever
//! referenced by name.
//!
//! ## Routing keys
//!
//! - `pause` (exact)
//! - `army-move.<username>`; bind `army-move.*` to hear every player
//! - `game-log.<username>`; the log consumer binds `game-log.*`

use std::fmt;

/// Direct exchange carrying control signals.
pub const EXCHANGE_DIRECT: &str = "direct-control";

/// Topic exchange carrying per-player events and logs.
pub const EXCHANGE_TOPIC: &str = "topic-events";

/// Routing key for pause/resume signals.
pub const PAUSE_KEY: &str = "pause";

/// Routing-key prefix for army moves.
pub const ARMY_MOVES_PREFIX: &str = "army-move";

/// Routing-key prefix for game log lines.
pub const GAME_LOG_PREFIX: &str = "game-log";

/// Name of the durable queue shared by every game-log consumer.
pub const GAME_LOG_QUEUE: &str = "game-log";

/// Routing rule applied by an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    /// Exact routing-key match.
    Direct,
    /// Dot-delimited wildcard match (`*` one segment, `#` zero or more).
    Topic,
}

impl ExchangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Topic => "topic",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exchange the game expects to exist on the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeDefinition {
    pub name: &'static str,
    pub kind: ExchangeKind,
}

/// Every exchange the game routes through.
pub const EXCHANGES: [ExchangeDefinition; 2] = [
    ExchangeDefinition {
        name: EXCHANGE_DIRECT,
        kind: ExchangeKind::Direct,
    },
    ExchangeDefinition {
        name: EXCHANGE_TOPIC,
        kind: ExchangeKind::Topic,
    },
];

/// Queue lifetime policy.
///
/// | Policy | durable | exclusive | auto-delete |
/// |---|---|---|---|
/// | `Transient` | false | true | true |
/// | `Durable` | true | false | false |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueLifetime {
    /// Survives broker restarts and is shared between consumers.
    Durable,
    /// Private to the declaring connection; deleted once abandoned.
    Transient,
}

impl QueueLifetime {
    pub fn durable(self) -> bool {
        matches!(self, QueueLifetime::Durable)
    }

    pub fn exclusive(self) -> bool {
        matches!(self, QueueLifetime::Transient)
    }

    pub fn auto_delete(self) -> bool {
        matches!(self, QueueLifetime::Transient)
    }
}

impl fmt::Display for QueueLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueLifetime::Durable => f.write_str("durable"),
            QueueLifetime::Transient => f.write_str("transient"),
        }
    }
}

/// `<prefix>.<username>`
pub fn player_key(prefix: &str, username: &str) -> String {
    format!("{prefix}.{username}")
}

/// `<prefix>.*`, matching every player's key under `prefix`.
pub fn all_players(prefix: &str) -> String {
    format!("{prefix}.*")
}

/// Routing key for an army move published by `username`.
pub fn army_move_key(username: &str) -> String {
    player_key(ARMY_MOVES_PREFIX, username)
}

/// Routing key for a game log line written by `username`.
pub fn game_log_key(username: &str) -> String {
    player_key(GAME_LOG_PREFIX, username)
}

/// Per-client transient queue receiving pause signals.
pub fn pause_queue(username: &str) -> String {
    player_key(PAUSE_KEY, username)
}

/// Per-client transient queue receiving army moves.
pub fn army_move_queue(username: &str) -> String {
    player_key(ARMY_MOVES_PREFIX, username)
}
