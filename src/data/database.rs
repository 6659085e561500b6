//! Read-only content catalogs keyed by identifier
//!
//! The on-disk form is a single TOML document with one array of tables per
//! catalog plus a `[constants]` table. Catalogs are indexed into hash maps
//! on load.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{EmblemError, Result};
use crate::core::types::{Team, UnitId};
use crate::data::constants::Constants;
use crate::support::CombatBonus;
use crate::units::{Item, Stats, Unit};

/// Movement group used when a class does not name one
pub const DEFAULT_MOVEMENT_GROUP: &str = "infantry";

/// Costs at or above this are impassable
pub const IMPASSABLE: u32 = 99;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_movement_group")]
    pub movement_group: String,
    #[serde(default)]
    pub combat_anim: Option<String>,
    /// Units of this class may spend leftover MOV after acting
    #[serde(default)]
    pub canto: bool,
}

fn default_movement_group() -> String {
    DEFAULT_MOVEMENT_GROUP.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Cost to enter, keyed by movement group; missing groups cannot enter
    #[serde(default)]
    pub costs: AHashMap<String, u32>,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub avoid: i32,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

impl TerrainDef {
    /// Cost for `group` to enter, `None` when impassable
    pub fn cost(&self, group: &str) -> Option<u32> {
        self.costs.get(group).copied().filter(|c| *c < IMPASSABLE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinityDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Bonus granted per support rank
    #[serde(default)]
    pub bonuses: AHashMap<String, CombatBonus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRequirement {
    pub rank: String,
    /// Points needed to reach this rank
    pub requirement: u32,
    /// Rank that must already be unlocked
    #[serde(default)]
    pub gate: Option<String>,
    /// Pair-specific bonus while this is the highest unlocked rank
    #[serde(default)]
    pub bonus: Option<CombatBonus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportPrefab {
    pub unit_a: UnitId,
    pub unit_b: UnitId,
    pub ranks: Vec<RankRequirement>,
}

impl SupportPrefab {
    pub fn involves(&self, unit: &UnitId) -> bool {
        &self.unit_a == unit || &self.unit_b == unit
    }

    pub fn requirement(&self, rank: &str) -> Option<&RankRequirement> {
        self.ranks.iter().find(|r| r.rank == rank)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPrefab {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub class: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub stats: Stats,
    #[serde(default)]
    pub growths: Stats,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub affinity: Option<String>,
    #[serde(default)]
    pub ai: Option<String>,
}

fn default_level() -> u32 {
    1
}

/// What an AI-controlled unit is allowed to do
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDef {
    pub id: String,
    #[serde(default)]
    pub attack: bool,
    /// Advance toward the nearest enemy when nothing is in reach
    #[serde(default)]
    pub seek: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub max: Option<i32>,
}

/// Timing script for animated combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatAnimDef {
    pub id: String,
    pub palette: String,
    #[serde(default = "default_anticipation")]
    pub anticipation_ms: u32,
    #[serde(default = "default_lunge")]
    pub lunge_ms: u32,
    #[serde(default = "default_impact")]
    pub impact_ms: u32,
    #[serde(default = "default_recoil")]
    pub recoil_ms: u32,
    /// How far the attacker lunges, in game pixels
    #[serde(default = "default_lunge_distance")]
    pub lunge_distance: f32,
}

fn default_anticipation() -> u32 {
    200
}
fn default_lunge() -> u32 {
    150
}
fn default_impact() -> u32 {
    200
}
fn default_recoil() -> u32 {
    200
}
fn default_lunge_distance() -> f32 {
    24.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteDef {
    pub id: String,
    #[serde(default)]
    pub colors: Vec<[u8; 3]>,
}

/// Raw on-disk layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseFile {
    constants: Constants,
    classes: Vec<ClassDef>,
    items: Vec<Item>,
    terrain: Vec<TerrainDef>,
    affinities: Vec<AffinityDef>,
    supports: Vec<SupportPrefab>,
    units: Vec<UnitPrefab>,
    ai: Vec<AiDef>,
    stats: Vec<StatDef>,
    combat_anims: Vec<CombatAnimDef>,
    palettes: Vec<PaletteDef>,
}

/// All content catalogs plus the constants map
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub constants: Constants,
    pub classes: AHashMap<String, ClassDef>,
    pub items: AHashMap<String, Item>,
    pub terrain: AHashMap<String, TerrainDef>,
    pub affinities: AHashMap<String, AffinityDef>,
    pub supports: Vec<SupportPrefab>,
    pub units: AHashMap<String, UnitPrefab>,
    pub ai: AHashMap<String, AiDef>,
    pub stats: AHashMap<String, StatDef>,
    pub combat_anims: AHashMap<String, CombatAnimDef>,
    pub palettes: AHashMap<String, PaletteDef>,
}

fn index_by<T>(list: Vec<T>, key: impl Fn(&T) -> String) -> AHashMap<String, T> {
    list.into_iter().map(|item| (key(&item), item)).collect()
}

impl Database {
    /// Empty database with the built-in AI definitions
    pub fn new(constants: Constants) -> Self {
        let mut db = Self {
            constants,
            ..Self::default()
        };
        db.install_builtin_ai();
        db
    }

    /// Parse a database TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DatabaseFile = toml::from_str(content)?;
        file.constants.validate().map_err(EmblemError::Content)?;

        let mut db = Self {
            constants: file.constants,
            classes: index_by(file.classes, |c| c.id.clone()),
            items: index_by(file.items, |i| i.id.clone()),
            terrain: index_by(file.terrain, |t| t.id.clone()),
            affinities: index_by(file.affinities, |a| a.id.clone()),
            supports: file.supports,
            units: index_by(file.units, |u| u.id.clone()),
            ai: index_by(file.ai, |a| a.id.clone()),
            stats: index_by(file.stats, |s| s.id.clone()),
            combat_anims: index_by(file.combat_anims, |a| a.id.clone()),
            palettes: index_by(file.palettes, |p| p.id.clone()),
        };
        db.install_builtin_ai();

        tracing::debug!(
            "Loaded database: {} classes, {} items, {} terrain, {} units",
            db.classes.len(),
            db.items.len(),
            db.terrain.len(),
            db.units.len()
        );
        Ok(db)
    }

    /// Load a database from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn install_builtin_ai(&mut self) {
        for (id, attack, seek) in [("none", false, false), ("defend", true, false), ("pursue", true, true)] {
            self.ai.entry(id.to_string()).or_insert_with(|| AiDef {
                id: id.to_string(),
                attack,
                seek,
            });
        }
    }

    // === BUILDERS ===

    pub fn add_class(&mut self, class: ClassDef) {
        self.classes.insert(class.id.clone(), class);
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn add_terrain(&mut self, terrain: TerrainDef) {
        self.terrain.insert(terrain.id.clone(), terrain);
    }

    pub fn add_affinity(&mut self, affinity: AffinityDef) {
        self.affinities.insert(affinity.id.clone(), affinity);
    }

    pub fn add_support(&mut self, prefab: SupportPrefab) {
        self.supports.push(prefab);
    }

    pub fn add_unit_prefab(&mut self, prefab: UnitPrefab) {
        self.units.insert(prefab.id.clone(), prefab);
    }

    // === QUERIES ===

    pub fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn terrain(&self, id: &str) -> Option<&TerrainDef> {
        self.terrain.get(id)
    }

    pub fn affinity(&self, id: &str) -> Option<&AffinityDef> {
        self.affinities.get(id)
    }

    pub fn ai(&self, id: &str) -> Option<&AiDef> {
        self.ai.get(id)
    }

    pub fn combat_anim(&self, id: &str) -> Option<&CombatAnimDef> {
        self.combat_anims.get(id)
    }

    pub fn palette(&self, id: &str) -> Option<&PaletteDef> {
        self.palettes.get(id)
    }

    pub fn unit_prefab(&self, id: &str) -> Option<&UnitPrefab> {
        self.units.get(id)
    }

    /// Movement group of a class, defaulting to infantry
    pub fn movement_group(&self, class_id: &str) -> &str {
        self.class(class_id)
            .map(|c| c.movement_group.as_str())
            .unwrap_or(DEFAULT_MOVEMENT_GROUP)
    }

    /// Same team, or listed together in an alliance group
    pub fn are_allied(&self, a: &Team, b: &Team) -> bool {
        a == b
            || self.constants.alliances.iter().any(|group| {
                group.iter().any(|t| t == a.as_str()) && group.iter().any(|t| t == b.as_str())
            })
    }

    /// Build a fresh unit from a prefab
    pub fn instantiate_unit(&self, id: UnitId, prefab_id: &str, team: Team) -> Result<Unit> {
        let prefab = self
            .unit_prefab(prefab_id)
            .ok_or_else(|| EmblemError::Content(format!("unknown unit prefab '{}'", prefab_id)))?;

        let mut unit = Unit::new(id, team, prefab.class.clone(), prefab.stats);
        if !prefab.name.is_empty() {
            unit.name = prefab.name.clone();
        }
        unit.level = prefab.level;
        unit.growths = prefab.growths;
        unit.affinity = prefab.affinity.clone();
        if let Some(ai) = &prefab.ai {
            unit.ai = ai.clone();
        }
        unit.flags.has_canto = self.class(&prefab.class).is_some_and(|c| c.canto);

        for item_id in &prefab.items {
            match self.item(item_id) {
                Some(item) => unit.items.push(item.clone()),
                None => tracing::warn!("Unit prefab '{}' lists unknown item '{}'", prefab_id, item_id),
            }
        }
        unit.items.truncate(self.constants.inventory_size);

        Ok(unit)
    }
}
