//! Chapter layout: terrain rows, unit placements, regions and scripts

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{EmblemError, Result};
use crate::core::types::{Team, TilePos, UnitId};
use crate::data::database::Database;
use crate::event::EventDef;
use crate::map::{GameBoard, Region};

/// How the chapter is won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinCondition {
    /// Defeat every enemy
    #[default]
    Rout,
    /// Seize the throne (a seize region); routing also wins
    Seize,
}

/// Placement of one unit in the chapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelUnit {
    pub id: UnitId,
    /// Database prefab; defaults to the unit id
    #[serde(default)]
    pub prefab: Option<String>,
    pub team: Team,
    /// Units without a position are reinforcements for `add_unit`
    #[serde(default)]
    pub position: Option<TilePos>,
    #[serde(default)]
    pub ai: Option<String>,
}

/// A scripted conversation between two adjacent units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkPair {
    pub unit_a: UnitId,
    pub unit_b: UnitId,
}

impl TalkPair {
    /// `speaker` may start this talk with `partner`
    pub fn matches(&self, speaker: &UnitId, partner: &UnitId) -> bool {
        (&self.unit_a == speaker && &self.unit_b == partner)
            || (&self.unit_b == speaker && &self.unit_a == partner)
    }
}

/// Chapter-wide rules consulted by the state machine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterRules {
    pub win: WinCondition,
    /// Losing this unit loses the chapter
    pub lord: Option<UnitId>,
    pub talks: Vec<TalkPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelPrefab {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Single-character tile codes, mapped through `legend`
    pub terrain: Vec<String>,
    pub legend: AHashMap<String, String>,
    #[serde(default)]
    pub units: Vec<LevelUnit>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub talks: Vec<TalkPair>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub win: WinCondition,
    #[serde(default)]
    pub lord: Option<UnitId>,
}

/// Everything a loaded chapter hands to the game context
#[derive(Debug)]
pub struct BuiltLevel {
    pub board: GameBoard,
    pub rules: ChapterRules,
    pub events: Vec<EventDef>,
}

impl LevelPrefab {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn height(&self) -> usize {
        self.terrain.len()
    }

    pub fn width(&self) -> usize {
        self.terrain.iter().map(|row| row.chars().count()).max().unwrap_or(0)
    }

    /// Instantiate the board, units and scripts
    pub fn build(&self, db: &Database) -> Result<BuiltLevel> {
        let width = self.width();
        let height = self.height();
        if width == 0 || height == 0 {
            return Err(EmblemError::Content(format!("level '{}' has no terrain", self.id)));
        }

        let mut board = GameBoard::new(width as i32, height as i32, "");
        for (y, row) in self.terrain.iter().enumerate() {
            for (x, code) in row.chars().enumerate() {
                let terrain = self.legend.get(&code.to_string()).ok_or_else(|| {
                    EmblemError::Content(format!("level '{}': no legend entry for '{}'", self.id, code))
                })?;
                if db.terrain(terrain).is_none() {
                    tracing::warn!("Level '{}' uses unknown terrain '{}'", self.id, terrain);
                }
                board.set_terrain(TilePos::new(x as i32, y as i32), terrain.clone());
            }
        }

        for placement in &self.units {
            let prefab = placement.prefab.as_deref().unwrap_or(placement.id.as_str());
            let mut unit = db.instantiate_unit(placement.id.clone(), prefab, placement.team.clone())?;
            if let Some(ai) = &placement.ai {
                unit.ai = ai.clone();
            }
            board.insert_unit(unit);
            if let Some(pos) = placement.position {
                board.set_unit(&placement.id, pos)?;
            }
        }

        for region in &self.regions {
            board.add_region(region.clone());
        }

        tracing::info!(
            "Built level '{}' ({}x{}, {} units)",
            self.id,
            width,
            height,
            self.units.len()
        );

        Ok(BuiltLevel {
            board,
            rules: ChapterRules {
                win: self.win,
                lord: self.lord.clone(),
                talks: self.talks.clone(),
            },
            events: self.events.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::constants::Constants;
    use crate::data::database::{TerrainDef, UnitPrefab};
    use crate::units::Stats;

    fn db() -> Database {
        let mut db = Database::new(Constants::default());
        db.add_terrain(TerrainDef {
            id: "plains".into(),
            name: "Plains".into(),
            costs: [("infantry".to_string(), 1)].into_iter().collect(),
            defense: 0,
            avoid: 0,
            platform: None,
            background: None,
        });
        db.add_unit_prefab(UnitPrefab {
            id: "soldier".into(),
            name: "Soldier".into(),
            class: "soldier".into(),
            level: 1,
            stats: Stats {
                hp: 18,
                movement: 5,
                ..Stats::default()
            },
            growths: Stats::default(),
            items: Vec::new(),
            affinity: None,
            ai: Some("pursue".into()),
        });
        db
    }

    const LEVEL: &str = r#"
        id = "prologue"
        terrain = ["...", "..."]
        win = "seize"
        lord = "hero"

        [legend]
        "." = "plains"

        [[units]]
        id = "hero"
        prefab = "soldier"
        team = "player"
        position = { x = 0, y = 0 }

        [[units]]
        id = "reinforcement"
        prefab = "soldier"
        team = "enemy"
        ai = "defend"
    "#;

    #[test]
    fn test_build_places_units() {
        let level = LevelPrefab::from_toml_str(LEVEL).unwrap();
        let built = level.build(&db()).unwrap();

        assert_eq!(built.board.width(), 3);
        assert_eq!(built.board.height(), 2);
        assert_eq!(
            built.board.unit_at(TilePos::new(0, 0)).map(|u| u.id.clone()),
            Some(UnitId::from("hero"))
        );
        let reinforcement = built.board.unit(&UnitId::from("reinforcement")).unwrap();
        assert!(reinforcement.position.is_none());
        assert_eq!(reinforcement.ai, "defend");
        assert_eq!(built.rules.win, WinCondition::Seize);
    }

    #[test]
    fn test_missing_legend_is_error() {
        let mut level = LevelPrefab::from_toml_str(LEVEL).unwrap();
        level.terrain[0] = "..X".into();
        assert!(level.build(&db()).is_err());
    }
}
