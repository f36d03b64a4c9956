use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
    NorthEast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CubeCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(x + y + z == 0, "cube coordinates must sum to zero");
        Self { x, y, z }
    }

    pub fn add(self, other: CubeCoord) -> Self {
        CubeCoord::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn neighbor(self, direction: Direction) -> Self {
        let offset = UNIT_VECTORS
            .get(&direction)
            .copied()
            .expect("unit vector defined for every direction");
        self.add(offset)
    }
}

impl Default for CubeCoord {
    fn default() -> Self {
        CubeCoord::new(0, 0, 0)
    }
}

pub static UNIT_VECTORS: Lazy<HashMap<Direction, CubeCoord>> = Lazy::new(|| {
    use Direction::*;
    HashMap::from([
        (NorthEast, CubeCoord::new(1, 0, -1)),
        (SouthWest, CubeCoord::new(-1, 0, 1)),
        (NorthWest, CubeCoord::new(0, 1, -1)),
        (SouthEast, CubeCoord::new(0, -1, 1)),
        (East, CubeCoord::new(1, -1, 0)),
        (West, CubeCoord::new(-1, 1, 0)),
    ])
});

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn opposite_directions_cancel() {
        let origin = CubeCoord::new(0, 0, 0);
        assert_eq!(origin.neighbor(Direction::East).neighbor(Direction::West), origin);
        assert_eq!(
            origin.neighbor(Direction::NorthEast).neighbor(Direction::SouthWest),
            origin
        );
        assert_eq!(
            origin.neighbor(Direction::NorthWest).neighbor(Direction::SouthEast),
            origin
        );
    }

    #[test]
    fn six_distinct_neighbors() {
        let origin = CubeCoord::new(0, 0, 0);
        let neighbors: std::collections::HashSet<CubeCoord> =
            Direction::iter().map(|d| origin.neighbor(d)).collect();
        assert_eq!(neighbors.len(), 6);
    }
}
