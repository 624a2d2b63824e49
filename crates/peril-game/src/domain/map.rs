//! The set of regions units can be placed in.

use std::collections::BTreeSet;
use std::fmt;

use super::errors::MapError;

/// Regions of the default map.
pub const DEFAULT_REGIONS: [&str; 6] = [
    "americas",
    "europe",
    "africa",
    "asia",
    "antarctica",
    "australia",
];

/// Valid regions, in the order they were configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    regions: Vec<String>,
}

impl GameMap {
    pub fn new<I, S>(regions: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for region in regions {
            let region: String = region.into();
            if region.is_empty() || region.chars().any(char::is_whitespace) {
                return Err(MapError::InvalidRegion(region));
            }
            if !seen.insert(region.clone()) {
                return Err(MapError::DuplicateRegion(region));
            }
            ordered.push(region);
        }
        if ordered.is_empty() {
            return Err(MapError::Empty);
        }
        Ok(Self { regions: ordered })
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }
}

impl Default for GameMap {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl fmt::Display for GameMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.regions.join(", "))
    }
}
