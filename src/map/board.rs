//! The game board: terrain grid, occupancy and the chapter's unit table
//!
//! The board owns every unit of the chapter, on the map or not. A unit's
//! `position` and the occupant of that cell are always updated together.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::error::{EmblemError, Result};
use crate::core::types::{Team, TilePos, UnitId};
use crate::data::Database;
use crate::units::{RescueSlot, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Seize,
    Visit,
    Shop,
}

/// Rectangular map area with a special action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub kind: RegionKind,
    pub position: TilePos,
    #[serde(default = "default_size")]
    pub size: (i32, i32),
    /// Event fired when the region is used
    #[serde(default)]
    pub event: Option<String>,
}

fn default_size() -> (i32, i32) {
    (1, 1)
}

impl Region {
    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x >= self.position.x
            && pos.y >= self.position.y
            && pos.x < self.position.x + self.size.0
            && pos.y < self.position.y + self.size.1
    }
}

#[derive(Debug, Clone)]
pub struct GameBoard {
    width: i32,
    height: i32,
    terrain: Vec<String>,
    occupants: Vec<Option<UnitId>>,
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
    regions: Vec<Region>,
}

impl GameBoard {
    /// Create a board filled with one terrain type
    pub fn new(width: i32, height: i32, terrain: &str) -> Self {
        let cells = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            terrain: vec![terrain.to_string(); cells],
            occupants: vec![None; cells],
            units: Vec::new(),
            index: AHashMap::new(),
            regions: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn cell(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    // === TERRAIN ===

    pub fn terrain(&self, pos: TilePos) -> Option<&str> {
        self.cell(pos).map(|i| self.terrain[i].as_str())
    }

    pub fn set_terrain(&mut self, pos: TilePos, terrain: impl Into<String>) {
        if let Some(i) = self.cell(pos) {
            self.terrain[i] = terrain.into();
        }
    }

    /// Cost for `group` to enter `pos`; `None` if impassable or out of
    /// bounds. Terrain missing from the database costs 1.
    pub fn movement_cost(&self, pos: TilePos, group: &str, db: &Database) -> Option<u32> {
        let terrain = self.terrain(pos)?;
        match db.terrain(terrain) {
            Some(def) => def.cost(group),
            None => Some(1),
        }
    }

    /// Defense and avoid granted by the terrain under `pos`
    pub fn terrain_bonus(&self, pos: TilePos, db: &Database) -> (i32, i32) {
        self.terrain(pos)
            .and_then(|t| db.terrain(t))
            .map(|def| (def.defense, def.avoid))
            .unwrap_or((0, 0))
    }

    // === OCCUPANCY ===

    pub fn unit_id_at(&self, pos: TilePos) -> Option<&UnitId> {
        self.cell(pos).and_then(|i| self.occupants[i].as_ref())
    }

    pub fn unit_at(&self, pos: TilePos) -> Option<&Unit> {
        self.unit_id_at(pos).and_then(|id| self.unit(id))
    }

    pub fn is_occupied(&self, pos: TilePos) -> bool {
        self.unit_id_at(pos).is_some()
    }

    // === UNIT TABLE ===

    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.index.get(id).map(|&i| &self.units[i])
    }

    pub fn unit_mut(&mut self, id: &UnitId) -> Option<&mut Unit> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.units[i]),
            None => None,
        }
    }

    fn require(&self, id: &UnitId) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| EmblemError::UnitNotFound(id.clone()))
    }

    /// Add a unit to the table, off the board. Use `set_unit` to place it.
    /// A unit with an id already in the table replaces the old entry.
    pub fn insert_unit(&mut self, mut unit: Unit) {
        if let Some(&i) = self.index.get(&unit.id) {
            let old_id = self.units[i].id.clone();
            self.remove_unit(&old_id);
            unit.position = None;
            self.units[i] = unit;
            return;
        }
        unit.position = None;
        self.index.insert(unit.id.clone(), self.units.len());
        self.units.push(unit);
    }

    /// Every unit in the chapter, in insertion order
    pub fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Living units currently on the map
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.position.is_some())
    }

    /// Living units of `team` currently on the map
    pub fn team_units<'a>(&'a self, team: &'a Team) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units().filter(move |u| &u.team == team)
    }

    /// Ids of `team`'s units on the map, in insertion order
    pub fn team_unit_ids(&self, team: &Team) -> Vec<UnitId> {
        self.team_units(team).map(|u| u.id.clone()).collect()
    }

    /// Living units of `team`, including carried ones
    pub fn living_team_units<'a>(&'a self, team: &'a Team) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units
            .iter()
            .filter(move |u| u.is_alive() && &u.team == team && (u.position.is_some() || u.carrier().is_some()))
    }

    /// Place an off-board unit, or move an on-board one
    pub fn set_unit(&mut self, id: &UnitId, pos: TilePos) -> Result<()> {
        self.move_unit(id, pos)
    }

    /// Move a unit to `pos`, updating the cell map and the unit's position
    /// together
    pub fn move_unit(&mut self, id: &UnitId, pos: TilePos) -> Result<()> {
        let i = self.require(id)?;
        let target = self.cell(pos).ok_or(EmblemError::OutOfBounds(pos))?;
        if let Some(occupant) = &self.occupants[target] {
            if occupant != id {
                return Err(EmblemError::Content(format!(
                    "cannot move {} to {:?}: occupied by {}",
                    id, pos, occupant
                )));
            }
        }

        if let Some(old) = self.units[i].position.and_then(|p| self.cell(p)) {
            self.occupants[old] = None;
        }
        self.occupants[target] = Some(id.clone());
        self.units[i].position = Some(pos);
        Ok(())
    }

    /// Take a unit off the map. It stays in the unit table.
    pub fn remove_unit(&mut self, id: &UnitId) -> Option<TilePos> {
        let i = *self.index.get(id)?;
        let pos = self.units[i].position.take()?;
        if let Some(cell) = self.cell(pos) {
            if self.occupants[cell].as_ref() == Some(id) {
                self.occupants[cell] = None;
            }
        }
        Some(pos)
    }

    /// Break every rescue link `id` takes part in. A unit it was carrying
    /// is set down on the nearest free tile to `near`.
    pub fn release_rescue(&mut self, id: &UnitId, near: Option<TilePos>, db: &Database) -> Result<()> {
        let i = self.require(id)?;
        match std::mem::take(&mut self.units[i].rescue) {
            RescueSlot::Carrying(carried) => {
                if let Some(c) = self.unit_mut(&carried) {
                    c.rescue = RescueSlot::Empty;
                }
                if let Some(origin) = near {
                    let group = self
                        .unit(&carried)
                        .map(|c| db.movement_group(&c.class_id).to_string())
                        .unwrap_or_default();
                    if let Some(free) = self.nearest_free_tile(origin, &group, db) {
                        self.move_unit(&carried, free)?;
                    }
                }
            }
            RescueSlot::CarriedBy(carrier) => {
                if let Some(c) = self.unit_mut(&carrier) {
                    c.rescue = RescueSlot::Empty;
                }
            }
            RescueSlot::Empty => {}
        }
        Ok(())
    }

    /// Kill a unit: off the map, HP 0, dead. A carried unit is dropped on
    /// the nearest free tile and a carrier link is cleared.
    pub fn kill_unit(&mut self, id: &UnitId, db: &Database) -> Result<()> {
        let i = self.require(id)?;
        let last_pos = self.remove_unit(id);
        self.units[i].mark_dead();
        self.release_rescue(id, last_pos, db)?;

        tracing::debug!("Unit {} removed from the board (dead)", id);
        Ok(())
    }

    /// Closest unoccupied tile `group` can stand on, by Manhattan
    /// distance (breadth-first over the grid)
    pub fn nearest_free_tile(&self, from: TilePos, group: &str, db: &Database) -> Option<TilePos> {
        if !self.in_bounds(from) {
            return None;
        }
        let mut seen = vec![false; self.occupants.len()];
        let mut queue = VecDeque::from([from]);
        seen[self.cell(from)?] = true;

        while let Some(pos) = queue.pop_front() {
            if !self.is_occupied(pos) && self.movement_cost(pos, group, db).is_some() {
                return Some(pos);
            }
            for next in pos.neighbors() {
                if let Some(cell) = self.cell(next) {
                    if !seen[cell] {
                        seen[cell] = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        None
    }

    // === REGIONS ===

    pub fn add_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region_at(&self, pos: TilePos) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(pos))
    }

    /// Visits and shops close after use
    pub fn remove_region(&mut self, id: &str) -> Option<Region> {
        let i = self.regions.iter().position(|r| r.id == id)?;
        Some(self.regions.remove(i))
    }

    /// Every unit position agrees with the cell map
    pub fn is_consistent(&self) -> bool {
        let positions_ok = self.units.iter().all(|u| match u.position {
            Some(p) => self.unit_id_at(p) == Some(&u.id),
            None => true,
        });
        let cells_ok = self.occupants.iter().enumerate().all(|(i, occ)| match occ {
            Some(id) => {
                let pos = TilePos::new(i as i32 % self.width, i as i32 / self.width);
                self.unit(id).is_some_and(|u| u.position == Some(pos))
            }
            None => true,
        });
        positions_ok && cells_ok
    }
}
