//! Movement ranges, attack silhouettes and shortest paths on the board
//!
//! Every query reads an immutable board. A cell is pass-through for a unit
//! when it is empty or held by an ally; a valid stop when it is also not
//! held by another unit.

use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use crate::core::types::{TilePos, UnitId};
use crate::data::Database;
use crate::map::board::GameBoard;
use crate::units::Unit;

/// Tiles a unit can end its move on, with the cost to reach them
#[derive(Debug, Clone, Default)]
pub struct MoveRange {
    pub origin: TilePos,
    pub budget: u32,
    /// Cheapest cost to every pass-through tile within budget
    costs: AHashMap<TilePos, u32>,
    stops: BTreeSet<TilePos>,
}

impl MoveRange {
    pub fn contains(&self, pos: TilePos) -> bool {
        self.stops.contains(&pos)
    }

    /// Cost to reach a stop tile
    pub fn cost(&self, pos: TilePos) -> Option<u32> {
        if self.stops.contains(&pos) {
            self.costs.get(&pos).copied()
        } else {
            None
        }
    }

    /// Stop tiles, ordered by column then row
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.stops.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

fn passes(board: &GameBoard, db: &Database, mover: &Unit, pos: TilePos) -> bool {
    match board.unit_at(pos) {
        None => true,
        Some(other) => other.id == mover.id || db.are_allied(&mover.team, &other.team),
    }
}

fn can_stop(board: &GameBoard, mover: &Unit, pos: TilePos) -> bool {
    match board.unit_id_at(pos) {
        None => true,
        Some(id) => *id == mover.id,
    }
}

/// Reachable set using the unit's full MOV
pub fn reachable(board: &GameBoard, db: &Database, unit: &Unit) -> MoveRange {
    reachable_within(board, db, unit, unit.movement())
}

/// Reachable set with an explicit movement budget (Canto uses what is left)
pub fn reachable_within(board: &GameBoard, db: &Database, unit: &Unit, budget: u32) -> MoveRange {
    let Some(origin) = unit.position else {
        return MoveRange::default();
    };
    let group = db.movement_group(&unit.class_id);

    let mut costs: AHashMap<TilePos, u32> = AHashMap::new();
    let mut open = BinaryHeap::new();
    costs.insert(origin, 0);
    open.push(PathNode { pos: origin, f_cost: 0 });

    while let Some(PathNode { pos, f_cost: cost }) = open.pop() {
        if costs.get(&pos).is_some_and(|&best| cost > best) {
            continue;
        }
        for next in pos.neighbors() {
            let Some(step) = board.movement_cost(next, group, db) else {
                continue;
            };
            if !passes(board, db, unit, next) {
                continue;
            }
            let total = cost + step;
            if total > budget {
                continue;
            }
            if costs.get(&next).map_or(true, |&best| total < best) {
                costs.insert(next, total);
                open.push(PathNode { pos: next, f_cost: total });
            }
        }
    }

    let stops = costs
        .keys()
        .copied()
        .filter(|&pos| can_stop(board, unit, pos))
        .collect();

    MoveRange {
        origin,
        budget,
        costs,
        stops,
    }
}

/// Tiles attackable from the range but outside it, across every weapon the
/// unit carries
pub fn attack_silhouette(board: &GameBoard, unit: &Unit, range: &MoveRange) -> BTreeSet<TilePos> {
    let bands: Vec<(u32, u32)> = unit.weapons().map(|w| (w.min_range, w.max_range)).collect();
    let mut tiles = BTreeSet::new();
    if bands.is_empty() {
        return tiles;
    }

    for from in range.tiles() {
        for &(min, max) in &bands {
            for pos in from.ring(min, max) {
                if board.in_bounds(pos) && !range.contains(pos) {
                    tiles.insert(pos);
                }
            }
        }
    }
    tiles
}

/// Every tile the unit threatens this turn: where it can stand plus what it
/// can hit from there
pub fn attackable_tiles(board: &GameBoard, db: &Database, unit: &Unit) -> BTreeSet<TilePos> {
    let range = reachable(board, db, unit);
    let mut tiles = attack_silhouette(board, unit, &range);
    tiles.extend(range.tiles());
    tiles
}

/// Enemies within the equipped weapon's range when standing on `from`
pub fn targets_from(board: &GameBoard, db: &Database, unit: &Unit, from: TilePos) -> Vec<UnitId> {
    let Some(weapon) = unit.equipped_stats() else {
        return Vec::new();
    };
    board
        .units()
        .filter(|other| other.id != unit.id && !db.are_allied(&unit.team, &other.team))
        .filter(|other| {
            other
                .position
                .is_some_and(|p| weapon.in_range(from.distance(&p)))
        })
        .map(|other| other.id.clone())
        .collect()
}

/// Node in the open set, ordered for a min-heap with a stable tie-break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathNode {
    pos: TilePos,
    f_cost: u32,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path from the unit's tile to `goal`, endpoints included
///
/// Enemy-held cells are never passed through. The goal itself may hold an
/// enemy, which lets the AI path toward a target; `truncate_path` never
/// ends a move there.
pub fn find_path(board: &GameBoard, db: &Database, unit: &Unit, goal: TilePos) -> Option<Vec<TilePos>> {
    let start = unit.position?;
    if start == goal {
        return Some(vec![start]);
    }
    let group = db.movement_group(&unit.class_id);
    board.movement_cost(goal, group, db)?;

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<TilePos, TilePos> = AHashMap::new();
    let mut g_scores: AHashMap<TilePos, u32> = AHashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        pos: start,
        f_cost: start.distance(&goal),
    });

    while let Some(current) = open_set.pop() {
        if current.pos == goal {
            return Some(reconstruct_path(&came_from, goal));
        }

        let current_g = g_scores.get(&current.pos).copied().unwrap_or(u32::MAX);

        for neighbor in current.pos.neighbors() {
            let Some(step) = board.movement_cost(neighbor, group, db) else {
                continue;
            };
            if neighbor != goal && !passes(board, db, unit, neighbor) {
                continue;
            }

            let tentative_g = current_g.saturating_add(step);
            if tentative_g < g_scores.get(&neighbor).copied().unwrap_or(u32::MAX) {
                came_from.insert(neighbor, current.pos);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    pos: neighbor,
                    f_cost: tentative_g + neighbor.distance(&goal),
                });
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &AHashMap<TilePos, TilePos>, mut current: TilePos) -> Vec<TilePos> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Sum of entry costs along a path (the starting tile is free)
pub fn path_cost(board: &GameBoard, db: &Database, group: &str, path: &[TilePos]) -> u32 {
    path.iter()
        .skip(1)
        .filter_map(|&pos| board.movement_cost(pos, group, db))
        .sum()
}

/// Trim a path to the furthest tile reachable within `budget`
///
/// Walks through allies, stops before enemies and never ends on a tile
/// another unit holds.
pub fn truncate_path(
    board: &GameBoard,
    db: &Database,
    unit: &Unit,
    path: &[TilePos],
    budget: u32,
) -> Vec<TilePos> {
    if path.is_empty() {
        return Vec::new();
    }
    let group = db.movement_group(&unit.class_id);
    let mut spent = 0;
    let mut keep = 1;

    for (i, &pos) in path.iter().enumerate().skip(1) {
        if !passes(board, db, unit, pos) {
            break;
        }
        let Some(step) = board.movement_cost(pos, group, db) else {
            break;
        };
        spent += step;
        if spent > budget {
            break;
        }
        if can_stop(board, unit, pos) {
            keep = i + 1;
        }
    }

    path[..keep].to_vec()
}
