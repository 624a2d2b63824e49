//! # Game State Coordinator
//!
//! Owns the client's [`GameState`] behind a single `RwLock`. Message
//! handlers (delivery tasks) and the command loop (foreground) both call
//! in here; every mutation takes the write lock for its whole duration,
//! `command_status` takes the read lock.
//!
//! ```text
//! command loop ──command_*──┐
//!                           ├──→ RwLock<GameState>
//! delivery tasks ──handle_*─┘
//! ```
//!
//! Nothing here publishes. `command_move` returns the [`ArmyMove`] and the
//! caller broadcasts it.

use parking_lot::RwLock;
use shared_types::{ArmyMove, PlayingState, Unit};
use tracing::{debug, info};

use crate::domain::{
    CommandError, GameMap, GameState, MoveOutcome, StatusReport, UnitOrder, MOVE_USAGE,
    SPAWN_USAGE,
};

pub struct GameCoordinator {
    username: String,
    map: GameMap,
    state: RwLock<GameState>,
}

impl GameCoordinator {
    pub fn new(username: impl Into<String>, map: GameMap) -> Self {
        let username = username.into();
        Self {
            state: RwLock::new(GameState::new(username.clone())),
            username,
            map,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Apply a pause/resume signal. The last signal wins.
    pub fn handle_pause(&self, signal: PlayingState) {
        let changed = self.state.write().set_paused(signal.is_paused);
        if changed {
            info!(player = %self.username, paused = signal.is_paused, "Pause state changed");
        } else {
            debug!(player = %self.username, paused = signal.is_paused, "Pause signal repeated");
        }
    }

    /// Record a move broadcast by any player, including this one.
    pub fn handle_move(&self, army: &ArmyMove) -> MoveOutcome {
        let outcome = self.state.write().merge_move(army);
        match outcome {
            MoveOutcome::SelfDelivery => {
                debug!(player = %self.username, to_region = %army.to_region, "Own move echoed back");
            }
            MoveOutcome::Merged { units } => {
                info!(
                    player = %self.username,
                    mover = %army.player.username,
                    to_region = %army.to_region,
                    units,
                    "Army move observed"
                );
            }
        }
        outcome
    }

    /// `spawn <region> <unitType> <count>`: station new units. Local only.
    pub fn command_spawn(&self, args: &[&str]) -> Result<Vec<Unit>, CommandError> {
        let order = UnitOrder::parse(args, &self.map, SPAWN_USAGE)?;
        let spawned = self.state.write().spawn(&order);
        debug!(
            player = %self.username,
            region = %order.region,
            rank = %order.rank,
            count = order.count,
            "Units spawned"
        );
        Ok(spawned)
    }

    /// `move <region> <unitType> <count>`: dispatch units and return the
    /// army to broadcast. State is unchanged on error.
    pub fn command_move(&self, args: &[&str]) -> Result<ArmyMove, CommandError> {
        let order = UnitOrder::parse(args, &self.map, MOVE_USAGE)?;
        let army = self.state.write().dispatch(&order)?;
        debug!(
            player = %self.username,
            to_region = %army.to_region,
            units = army.units.len(),
            "Army dispatched"
        );
        Ok(army)
    }

    /// Take back a move whose broadcast failed.
    pub fn cancel_move(&self, army: &ArmyMove) {
        if self.state.write().recall(army) {
            debug!(player = %self.username, to_region = %army.to_region, "Army recalled");
        }
    }

    pub fn command_status(&self) -> StatusReport {
        self.state.read().status()
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().is_paused()
    }

    /// Stationed and visible units in `region`.
    pub fn units_in_region(&self, region: &str) -> usize {
        self.state.read().units_in_region(region)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> GameState {
        self.state.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::{PlayerState, UnitRank};
    use std::sync::Arc;

    fn coordinator(username: &str) -> GameCoordinator {
        GameCoordinator::new(username, GameMap::new(["region1", "region7"]).unwrap())
    }

    #[test]
    fn test_alice_moves_three_of_five() {
        let alice = coordinator("alice");
        alice.command_spawn(&["region7", "infantry", "5"]).unwrap();

        let army = alice.command_move(&["region7", "infantry", "3"]).unwrap();

        assert_eq!(army.player, PlayerState::new("alice"));
        assert_eq!(army.to_region, "region7");
        assert_eq!(army.count_of(UnitRank::Infantry), 3);
        assert_eq!(army.units.len(), 3);
        assert_eq!(
            alice.command_status().garrison_count("region7", UnitRank::Infantry),
            2
        );
    }

    #[test]
    fn test_insufficient_units_leave_state_unchanged() {
        let alice = coordinator("alice");
        alice.command_spawn(&["region1", "cavalry", "2"]).unwrap();
        let before = alice.snapshot();

        let err = alice.command_move(&["region1", "cavalry", "3"]).unwrap_err();

        assert!(matches!(err, CommandError::InsufficientUnits { available: 2, .. }));
        assert_eq!(alice.snapshot(), before);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let alice = coordinator("alice");
        assert_eq!(
            alice.command_spawn(&["europe", "infantry", "1"]),
            Err(CommandError::UnknownRegion("europe".into()))
        );
        assert_eq!(
            alice.command_move(&["region1"]),
            Err(CommandError::Usage(MOVE_USAGE))
        );
        assert_eq!(alice.snapshot(), GameState::new("alice"));
    }

    #[test]
    fn test_oversized_spawn_rejected_without_allocating() {
        let alice = coordinator("alice");

        assert_eq!(
            alice.command_spawn(&["region7", "infantry", "18446744073709551615"]),
            Err(CommandError::InvalidCount("18446744073709551615".into()))
        );
        assert_eq!(
            alice.command_spawn(&["region7", "infantry", "1000000000"]),
            Err(CommandError::InvalidCount("1000000000".into()))
        );
        assert_eq!(alice.snapshot(), GameState::new("alice"));
    }

    #[test]
    fn test_self_delivery_suppressed() {
        let alice = coordinator("alice");
        alice.command_spawn(&["region7", "infantry", "5"]).unwrap();
        let army = alice.command_move(&["region7", "infantry", "3"]).unwrap();
        let before = alice.snapshot();

        assert_eq!(alice.handle_move(&army), MoveOutcome::SelfDelivery);

        assert_eq!(alice.snapshot(), before);
        assert_eq!(
            alice.command_status().garrison_count("region7", UnitRank::Infantry),
            2
        );
    }

    #[test]
    fn test_pause_gates_move() {
        let alice = coordinator("alice");
        alice.command_spawn(&["region1", "artillery", "1"]).unwrap();

        alice.handle_pause(PlayingState::PAUSED);
        assert_eq!(
            alice.command_move(&["region1", "artillery", "1"]),
            Err(CommandError::Paused)
        );

        alice.handle_pause(PlayingState::RESUMED);
        assert!(alice.command_move(&["region1", "artillery", "1"]).is_ok());
    }

    #[test]
    fn test_concurrent_move_and_spawn_lose_nothing() {
        const ROUNDS: u64 = 200;
        let alice = Arc::new(coordinator("alice"));

        let background = {
            let alice = Arc::clone(&alice);
            std::thread::spawn(move || {
                for id in 0..ROUNDS {
                    alice.handle_move(&ArmyMove {
                        player: PlayerState::new("bob"),
                        to_region: "region7".into(),
                        units: vec![Unit {
                            id,
                            rank: UnitRank::Infantry,
                            region: "region7".into(),
                        }],
                    });
                }
            })
        };
        for _ in 0..ROUNDS {
            alice.command_spawn(&["region7", "infantry", "1"]).unwrap();
        }
        background.join().unwrap();

        assert_eq!(alice.units_in_region("region7"), 2 * ROUNDS as usize);
    }

    proptest! {
        #[test]
        fn prop_last_pause_signal_wins(signals in proptest::collection::vec(any::<bool>(), 1..32)) {
            let alice = coordinator("alice");
            for &paused in &signals {
                alice.handle_pause(PlayingState { is_paused: paused });
            }
            prop_assert_eq!(alice.is_paused(), *signals.last().unwrap());
        }
    }
}
