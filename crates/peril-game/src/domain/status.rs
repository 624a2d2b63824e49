//! Read-only view of a player's game state.

use std::collections::BTreeMap;
use std::fmt;

use shared_types::{ArmyMove, UnitRank};

/// What `status` shows the player. Built under the read lock, rendered
/// after it is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub username: String,
    pub paused: bool,
    /// region -> rank -> count of the player's stationed units.
    pub garrison: BTreeMap<String, BTreeMap<UnitRank, usize>>,
    /// Armies this player sent out, oldest first.
    pub dispatched: Vec<ArmyMove>,
    /// player -> region -> count of units seen in other players' moves.
    pub visible: BTreeMap<String, BTreeMap<String, usize>>,
}

impl StatusReport {
    /// Stationed units of `rank` in `region`.
    pub fn garrison_count(&self, region: &str, rank: UnitRank) -> usize {
        self.garrison
            .get(region)
            .and_then(|ranks| ranks.get(&rank))
            .copied()
            .unwrap_or(0)
    }
}

fn write_ranks(f: &mut fmt::Formatter<'_>, ranks: &BTreeMap<UnitRank, usize>) -> fmt::Result {
    let parts: Vec<String> = ranks
        .iter()
        .map(|(rank, count)| format!("{count} {rank}"))
        .collect();
    f.write_str(&parts.join(", "))
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.paused { "paused" } else { "playing" };
        writeln!(f, "Player {} ({state})", self.username)?;

        if self.garrison.is_empty() {
            writeln!(f, "  No stationed units")?;
        } else {
            writeln!(f, "  Stationed units:")?;
            for (region, ranks) in &self.garrison {
                write!(f, "    {region}: ")?;
                write_ranks(f, ranks)?;
                writeln!(f)?;
            }
        }

        if !self.dispatched.is_empty() {
            writeln!(f, "  Dispatched armies:")?;
            for army in &self.dispatched {
                let mut ranks = BTreeMap::new();
                for unit in &army.units {
                    *ranks.entry(unit.rank).or_insert(0) += 1;
                }
                write!(f, "    -> {}: ", army.to_region)?;
                write_ranks(f, &ranks)?;
                writeln!(f)?;
            }
        }

        for (player, regions) in &self.visible {
            let parts: Vec<String> = regions
                .iter()
                .map(|(region, count)| format!("{region} {count}"))
                .collect();
            writeln!(f, "  {player}: {}", parts.join(", "))?;
        }
        Ok(())
    }
}
