//! # Game State
//!
//! Everything one client knows about the game. Mutated only through the
//! methods below; callers in other tasks go through
//! [`crate::GameCoordinator`], which serializes access.
//!
//! ## Unit ownership
//!
//! | Collection | Contents | Changed by |
//! |------------|----------|------------|
//! | `garrison` | the player's stationed units | spawn, move |
//! | `dispatched` | armies the player sent out | move |
//! | `visible` | other players' units, by player then unit id | received moves |

use std::collections::BTreeMap;

use shared_types::{ArmyMove, PlayerState, Unit, UnitRank};

use super::commands::UnitOrder;
use super::errors::CommandError;
use super::status::StatusReport;

/// What merging a received move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Another player's units were recorded at the destination.
    Merged { units: usize },
    /// The move was this player's own broadcast coming back; already applied.
    SelfDelivery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    player: PlayerState,
    paused: bool,
    garrison: BTreeMap<u64, Unit>,
    dispatched: Vec<ArmyMove>,
    visible: BTreeMap<String, BTreeMap<u64, Unit>>,
    next_unit_id: u64,
}

impl GameState {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            player: PlayerState::new(username),
            paused: false,
            garrison: BTreeMap::new(),
            dispatched: Vec::new(),
            visible: BTreeMap::new(),
            next_unit_id: 1,
        }
    }

    pub fn username(&self) -> &str {
        &self.player.username
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the pause flag. Returns whether it changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let changed = self.paused != paused;
        self.paused = paused;
        changed
    }

    /// Stationed units of `rank` in `region`.
    pub fn garrison_count(&self, region: &str, rank: UnitRank) -> usize {
        self.garrison
            .values()
            .filter(|u| u.region == region && u.rank == rank)
            .count()
    }

    pub fn dispatched(&self) -> &[ArmyMove] {
        &self.dispatched
    }

    /// Units of `player` last seen in `region`.
    pub fn visible_count(&self, player: &str, region: &str) -> usize {
        self.visible
            .get(player)
            .map_or(0, |units| units.values().filter(|u| u.region == region).count())
    }

    /// Stationed units plus other players' visible units in `region`.
    pub fn units_in_region(&self, region: &str) -> usize {
        let own = self.garrison.values().filter(|u| u.region == region).count();
        let others: usize = self
            .visible
            .values()
            .map(|units| units.values().filter(|u| u.region == region).count())
            .sum();
        own + others
    }

    /// Station `order.count` new units. Ids continue from the last spawn.
    pub fn spawn(&mut self, order: &UnitOrder) -> Vec<Unit> {
        let mut spawned = Vec::new();
        for _ in 0..order.count {
            let unit = Unit {
                id: self.next_unit_id,
                rank: order.rank,
                region: order.region.clone(),
            };
            self.next_unit_id += 1;
            self.garrison.insert(unit.id, unit.clone());
            spawned.push(unit);
        }
        spawned
    }

    /// Send `order.count` stationed units out as an army bound for
    /// `order.region`.
    ///
    /// Lowest ids leave first. Fails without touching state when paused or
    /// when the garrison is short.
    pub fn dispatch(&mut self, order: &UnitOrder) -> Result<ArmyMove, CommandError> {
        if self.paused {
            return Err(CommandError::Paused);
        }

        let ids: Vec<u64> = self
            .garrison
            .values()
            .filter(|u| u.region == order.region && u.rank == order.rank)
            .map(|u| u.id)
            .take(order.count)
            .collect();
        if ids.len() < order.count {
            return Err(CommandError::InsufficientUnits {
                region: order.region.clone(),
                rank: order.rank,
                requested: order.count,
                available: ids.len(),
            });
        }

        let units: Vec<Unit> = ids
            .iter()
            .filter_map(|id| self.garrison.remove(id))
            .collect();
        let army = ArmyMove {
            player: self.player.clone(),
            to_region: order.region.clone(),
            units,
        };
        self.dispatched.push(army.clone());
        Ok(army)
    }

    /// Undo [`Self::dispatch`]: return `army`'s units to the garrison and
    /// forget the army. Returns whether the army was found.
    pub fn recall(&mut self, army: &ArmyMove) -> bool {
        let Some(pos) = self.dispatched.iter().rposition(|a| a == army) else {
            return false;
        };
        let army = self.dispatched.remove(pos);
        for unit in army.units {
            self.garrison.insert(unit.id, unit);
        }
        true
    }

    /// Record another player's move. Re-merging the same move is a no-op.
    pub fn merge_move(&mut self, army: &ArmyMove) -> MoveOutcome {
        if army.player.username == self.player.username {
            return MoveOutcome::SelfDelivery;
        }

        let known = self
            .visible
            .entry(army.player.username.clone())
            .or_default();
        for unit in &army.units {
            known.insert(
                unit.id,
                Unit {
                    region: army.to_region.clone(),
                    ..unit.clone()
                },
            );
        }
        MoveOutcome::Merged {
            units: army.units.len(),
        }
    }

    pub fn status(&self) -> StatusReport {
        let mut garrison: BTreeMap<String, BTreeMap<UnitRank, usize>> = BTreeMap::new();
        for unit in self.garrison.values() {
            *garrison
                .entry(unit.region.clone())
                .or_default()
                .entry(unit.rank)
                .or_insert(0) += 1;
        }

        let mut visible: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for (player, units) in &self.visible {
            let regions = visible.entry(player.clone()).or_default();
            for unit in units.values() {
                *regions.entry(unit.region.clone()).or_insert(0) += 1;
            }
        }

        StatusReport {
            username: self.player.username.clone(),
            paused: self.paused,
            garrison,
            dispatched: self.dispatched.clone(),
            visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(region: &str, rank: UnitRank, count: usize) -> UnitOrder {
        UnitOrder {
            region: region.into(),
            rank,
            count,
        }
    }

    fn bob_move(to_region: &str, ids: &[u64]) -> ArmyMove {
        ArmyMove {
            player: PlayerState::new("bob"),
            to_region: to_region.into(),
            units: ids
                .iter()
                .map(|&id| Unit {
                    id,
                    rank: UnitRank::Infantry,
                    region: "asia".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut state = GameState::new("alice");
        let first = state.spawn(&order("europe", UnitRank::Infantry, 2));
        let second = state.spawn(&order("asia", UnitRank::Cavalry, 1));

        assert_eq!(first.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(second[0].id, 3);
        assert_eq!(state.garrison_count("europe", UnitRank::Infantry), 2);
    }

    #[test]
    fn test_dispatch_removes_lowest_ids() {
        let mut state = GameState::new("alice");
        state.spawn(&order("europe", UnitRank::Infantry, 3));

        let army = state.dispatch(&order("europe", UnitRank::Infantry, 2)).unwrap();

        assert_eq!(army.units.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(state.garrison_count("europe", UnitRank::Infantry), 1);
        assert_eq!(state.dispatched(), &[army]);
    }

    #[test]
    fn test_dispatch_ignores_other_ranks_and_regions() {
        let mut state = GameState::new("alice");
        state.spawn(&order("europe", UnitRank::Cavalry, 5));
        state.spawn(&order("asia", UnitRank::Infantry, 5));
        state.spawn(&order("europe", UnitRank::Infantry, 1));
        let before = state.clone();

        let err = state
            .dispatch(&order("europe", UnitRank::Infantry, 2))
            .unwrap_err();

        assert_eq!(
            err,
            CommandError::InsufficientUnits {
                region: "europe".into(),
                rank: UnitRank::Infantry,
                requested: 2,
                available: 1,
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_paused_blocks_dispatch_not_spawn() {
        let mut state = GameState::new("alice");
        assert!(state.set_paused(true));
        assert!(!state.set_paused(true));

        state.spawn(&order("europe", UnitRank::Infantry, 1));
        let before = state.clone();

        assert_eq!(
            state.dispatch(&order("europe", UnitRank::Infantry, 1)),
            Err(CommandError::Paused)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_recall_restores_garrison() {
        let mut state = GameState::new("alice");
        state.spawn(&order("europe", UnitRank::Infantry, 2));
        let before = state.clone();

        let army = state.dispatch(&order("europe", UnitRank::Infantry, 2)).unwrap();
        assert!(state.recall(&army));
        assert!(!state.recall(&army));

        assert_eq!(state, before);
    }

    #[test]
    fn test_merge_is_upsert() {
        let mut state = GameState::new("alice");

        assert_eq!(
            state.merge_move(&bob_move("africa", &[1, 2])),
            MoveOutcome::Merged { units: 2 }
        );
        // Redelivery of the same move changes nothing.
        state.merge_move(&bob_move("africa", &[1, 2]));
        assert_eq!(state.visible_count("bob", "africa"), 2);

        // Unit 2 marches on.
        state.merge_move(&bob_move("asia", &[2]));
        assert_eq!(state.visible_count("bob", "africa"), 1);
        assert_eq!(state.visible_count("bob", "asia"), 1);
    }

    #[test]
    fn test_own_move_is_self_delivery() {
        let mut state = GameState::new("alice");
        state.spawn(&order("europe", UnitRank::Infantry, 3));
        let army = state.dispatch(&order("europe", UnitRank::Infantry, 1)).unwrap();
        let before = state.clone();

        assert_eq!(state.merge_move(&army), MoveOutcome::SelfDelivery);
        assert_eq!(state, before);
    }

    #[test]
    fn test_units_in_region_counts_everyone() {
        let mut state = GameState::new("alice");
        state.spawn(&order("africa", UnitRank::Artillery, 2));
        state.merge_move(&bob_move("africa", &[7, 8, 9]));

        assert_eq!(state.units_in_region("africa"), 5);
        let status = state.status();
        assert_eq!(status.garrison_count("africa", UnitRank::Artillery), 2);
        assert_eq!(status.visible["bob"]["africa"], 3);
    }
}
