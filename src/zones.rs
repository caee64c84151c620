//! Zone quality lookup consumed by adult dispersal and feeding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::spatial::{Location, LocationKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRank {
    Excellent,
    Good,
    Regular,
    Poor,
    Terrible,
}

impl ZoneRank {
    /// Adults leave zones ranked this badly instead of feeding there.
    pub fn drives_dispersal(self) -> bool {
        matches!(self, ZoneRank::Poor | ZoneRank::Terrible)
    }
}

pub trait ZoneRanking {
    fn rank(&self, location: Location) -> ZoneRank;
}

/// Every location gets the same rank.
#[derive(Debug, Clone, Copy)]
pub struct UniformRanking(pub ZoneRank);

impl ZoneRanking for UniformRanking {
    fn rank(&self, _location: Location) -> ZoneRank {
        self.0
    }
}

/// Precomputed ranks per grid cell with a fallback for unranked cells.
#[derive(Debug, Clone)]
pub struct RankingTable {
    resolution_m: f64,
    default_rank: ZoneRank,
    cells: HashMap<LocationKey, ZoneRank>,
}

impl RankingTable {
    pub fn new(resolution_m: f64, default_rank: ZoneRank) -> Self {
        Self {
            resolution_m,
            default_rank,
            cells: HashMap::new(),
        }
    }

    pub fn insert(&mut self, location: Location, rank: ZoneRank) {
        self.cells
            .insert(LocationKey::quantize(location, self.resolution_m), rank);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl ZoneRanking for RankingTable {
    fn rank(&self, location: Location) -> ZoneRank {
        self.cells
            .get(&LocationKey::quantize(location, self.resolution_m))
            .copied()
            .unwrap_or(self.default_rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_falls_back_to_default() {
        let mut table = RankingTable::new(50.0, ZoneRank::Good);
        table.insert(Location::new(100.0, 100.0), ZoneRank::Terrible);

        assert_eq!(table.rank(Location::new(110.0, 90.0)), ZoneRank::Terrible);
        assert_eq!(table.rank(Location::new(0.0, 0.0)), ZoneRank::Good);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn only_poor_zones_drive_dispersal() {
        assert!(ZoneRank::Poor.drives_dispersal());
        assert!(ZoneRank::Terrible.drives_dispersal());
        assert!(!ZoneRank::Regular.drives_dispersal());
        assert!(!ZoneRank::Excellent.drives_dispersal());
    }
}
