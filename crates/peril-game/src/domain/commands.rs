//! Argument parsing for player commands.

use shared_types::UnitRank;

use super::errors::CommandError;
use super::map::GameMap;

pub const SPAWN_USAGE: &str = "spawn <region> <unitType> <count>";
pub const MOVE_USAGE: &str = "move <region> <unitType> <count>";

/// Largest count a single spawn or move may name.
pub const MAX_UNITS_PER_ORDER: usize = 10_000;

/// A validated `<region> <unitType> <count>` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOrder {
    pub region: String,
    pub rank: UnitRank,
    pub count: usize,
}

impl UnitOrder {
    /// Parse command arguments (without the command word) against `map`.
    ///
    /// Checks run in argument order, so the first bad argument is the one
    /// reported.
    pub fn parse(args: &[&str], map: &GameMap, usage: &'static str) -> Result<Self, CommandError> {
        let [region, rank, count] = args else {
            return Err(CommandError::Usage(usage));
        };

        if !map.contains(region) {
            return Err(CommandError::UnknownRegion((*region).to_string()));
        }
        let rank = rank
            .parse::<UnitRank>()
            .map_err(|e| CommandError::UnknownUnitType(e.0))?;
        let count = match count.parse::<usize>() {
            Ok(n) if (1..=MAX_UNITS_PER_ORDER).contains(&n) => n,
            _ => return Err(CommandError::InvalidCount((*count).to_string())),
        };

        Ok(Self {
            region: (*region).to_string(),
            rank,
            count,
        })
    }
}
