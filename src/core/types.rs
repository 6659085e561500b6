//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Unique identifier for units (level-scoped, e.g. "eirika" or "brigand_2")
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Faction a unit fights for ("player", "enemy", "other", ...)
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct Team(pub String);

impl Team {
    pub const PLAYER: &'static str = "player";
    pub const ENEMY: &'static str = "enemy";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn player() -> Self {
        Self::new(Self::PLAYER)
    }

    pub fn enemy() -> Self {
        Self::new(Self::ENEMY)
    }

    pub fn is_player(&self) -> bool {
        self.0 == Self::PLAYER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Team {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Tile coordinate on the game board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance on the square grid
    pub fn distance(&self, other: &Self) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// The 4 orthogonal neighbors (may be out of bounds)
    pub fn neighbors(&self) -> [TilePos; 4] {
        [
            TilePos::new(self.x + 1, self.y),
            TilePos::new(self.x, self.y - 1),
            TilePos::new(self.x - 1, self.y),
            TilePos::new(self.x, self.y + 1),
        ]
    }

    /// All tiles whose distance from self lies in `min..=max`
    pub fn ring(&self, min: u32, max: u32) -> Vec<TilePos> {
        let max_i = max as i32;
        let mut results = Vec::new();
        for dx in -max_i..=max_i {
            let rest = max_i - dx.abs();
            for dy in -rest..=rest {
                let d = (dx.abs() + dy.abs()) as u32;
                if d >= min {
                    results.push(TilePos::new(self.x + dx, self.y + dy));
                }
            }
        }
        results
    }

    pub fn offset(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for TilePos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Cardinal direction for cursor and camera movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Frame-local time in milliseconds
pub type Millis = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_distance() {
        let a = TilePos::new(2, 2);
        let b = TilePos::new(5, 0);
        assert_eq!(a.distance(&b), 5);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_ring_excludes_inner() {
        let center = TilePos::new(0, 0);
        let ring = center.ring(1, 1);
        assert_eq!(ring.len(), 4);
        assert!(!ring.contains(&center));

        let bow = center.ring(2, 2);
        assert_eq!(bow.len(), 8);
        assert!(bow.iter().all(|t| t.distance(&center) == 2));
    }

    #[test]
    fn test_team_player() {
        assert!(Team::player().is_player());
        assert!(!Team::enemy().is_player());
        assert_eq!(Team::from("enemy"), Team::enemy());
    }

    #[test]
    fn test_unit_id_display() {
        let id = UnitId::from("eirika");
        assert_eq!(id.to_string(), "eirika");
    }
}
