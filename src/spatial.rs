//! Planar locations and the quantized keys used to group individuals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in projected coordinates, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Moves `distance` metres along a compass bearing (degrees clockwise
    /// from north).
    pub fn moved(self, distance: f64, bearing_deg: f64) -> Self {
        let radians = bearing_deg.to_radians();
        Self {
            x: self.x + distance * radians.sin(),
            y: self.y + distance * radians.cos(),
        }
    }

    pub fn distance_to(self, other: Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Integer grid cell a location falls in. Two locations share a key iff they
/// round to the same cell at the population's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub col: i64,
    pub row: i64,
}

impl LocationKey {
    pub fn quantize(location: Location, resolution_m: f64) -> Self {
        Self {
            col: (location.x / resolution_m).round() as i64,
            row: (location.y / resolution_m).round() as i64,
        }
    }

    /// Centre of the cell in metres.
    pub fn center(self, resolution_m: f64) -> Location {
        Location::new(
            self.col as f64 * resolution_m,
            self.row as f64 * resolution_m,
        )
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}
