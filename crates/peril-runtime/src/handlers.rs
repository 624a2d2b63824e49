//! # Message Handlers
//!
//! Closures handed to [`shared_bus::subscribe_json`]. Each runs on its
//! subscription's delivery task; the message is acknowledged once it
//! returns.
//!
//! | Queue | Payload | Handler |
//! |-------|---------|---------|
//! | `pause.<username>` | `PlayingState` | [`pause_handler`] |
//! | `army-move.<username>` | `ArmyMove` | [`move_handler`] |
//! | `game-log` | `GameLog` | [`game_log_handler`] |

use std::sync::Arc;

use peril_game::GameCoordinator;
use shared_bus::HandlerError;
use shared_types::{ArmyMove, GameLog, PlayingState};
use tracing::debug;

use crate::game_log::GameLogWriter;

pub fn pause_handler(
    game: Arc<GameCoordinator>,
) -> impl Fn(PlayingState) -> Result<(), HandlerError> + Send + Sync + 'static {
    move |signal| {
        game.handle_pause(signal);
        Ok(())
    }
}

pub fn move_handler(
    game: Arc<GameCoordinator>,
) -> impl Fn(ArmyMove) -> Result<(), HandlerError> + Send + Sync + 'static {
    move |army| {
        game.handle_move(&army);
        Ok(())
    }
}

/// Persist every game log line. A write failure is returned to the
/// subscriber, which logs it.
pub fn game_log_handler(
    writer: Arc<GameLogWriter>,
) -> impl Fn(GameLog) -> Result<(), HandlerError> + Send + Sync + 'static {
    move |entry| {
        writer.append(&entry)?;
        debug!(player = %entry.username, path = %writer.path().display(), "Game log appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peril_game::GameMap;
    use shared_types::{PlayerState, Unit, UnitRank};

    #[test]
    fn test_pause_handler_sets_flag() {
        let game = Arc::new(GameCoordinator::new("alice", GameMap::default()));
        let handler = pause_handler(Arc::clone(&game));

        handler(PlayingState::PAUSED).unwrap();
        assert!(game.is_paused());
        handler(PlayingState::RESUMED).unwrap();
        assert!(!game.is_paused());
    }

    #[test]
    fn test_move_handler_records_other_players() {
        let game = Arc::new(GameCoordinator::new("alice", GameMap::default()));
        let handler = move_handler(Arc::clone(&game));

        handler(ArmyMove {
            player: PlayerState::new("bob"),
            to_region: "asia".into(),
            units: vec![Unit {
                id: 1,
                rank: UnitRank::Cavalry,
                region: "asia".into(),
            }],
        })
        .unwrap();

        assert_eq!(game.units_in_region("asia"), 1);
    }

    #[test]
    fn test_game_log_handler_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");
        let writer = Arc::new(GameLogWriter::open(&path).unwrap());
        let handler = game_log_handler(Arc::clone(&writer));

        handler(GameLog::now("bob", "hello")).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("bob: hello\n"));
    }
}
