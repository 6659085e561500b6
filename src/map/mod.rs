//! The tile map and the path system that queries it

pub mod board;
pub mod pathfinding;

pub use board::{GameBoard, Region, RegionKind};
pub use pathfinding::{
    attack_silhouette, attackable_tiles, find_path, path_cost, reachable, reachable_within,
    targets_from, truncate_path, MoveRange,
};
