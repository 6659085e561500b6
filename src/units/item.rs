//! Inventory items: weapons, healing items, stat boosters and consumables

use serde::{Deserialize, Serialize};

use crate::units::stats::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Healing,
    StatBooster,
    Consumable,
}

/// Combat properties of a weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub weapon_type: String,
    #[serde(default = "default_range")]
    pub min_range: u32,
    #[serde(default = "default_range")]
    pub max_range: u32,
    #[serde(default)]
    pub might: i32,
    #[serde(default)]
    pub hit: i32,
    #[serde(default)]
    pub crit: i32,
    #[serde(default)]
    pub weight: i32,
    /// Magic weapons target RES instead of DEF and scale with MAG
    #[serde(default)]
    pub magic: bool,
}

fn default_range() -> u32 {
    1
}

impl WeaponStats {
    pub fn in_range(&self, distance: u32) -> bool {
        distance >= self.min_range && distance <= self.max_range
    }
}

/// An inventory entry. Database prefabs use the same shape; a unit owns
/// a clone with its own remaining uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    /// Remaining uses; `None` never breaks
    #[serde(default)]
    pub uses: Option<u32>,
    #[serde(default)]
    pub weapon: Option<WeaponStats>,
    /// HP restored by healing items
    #[serde(default)]
    pub heal: i32,
    /// Permanent stat gains granted by stat boosters
    #[serde(default)]
    pub stat_effects: Stats,
}

impl Item {
    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon && self.weapon.is_some()
    }

    /// Items usable from the Item menu
    pub fn is_usable(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Healing | ItemKind::StatBooster | ItemKind::Consumable
        ) && !self.is_broken()
    }

    pub fn is_broken(&self) -> bool {
        self.uses == Some(0)
    }

    /// Spend one use. Returns true when the item just broke.
    pub fn consume_use(&mut self) -> bool {
        match self.uses.as_mut() {
            Some(uses) if *uses > 0 => {
                *uses -= 1;
                *uses == 0
            }
            _ => false,
        }
    }

    pub fn in_range(&self, distance: u32) -> bool {
        self.weapon.as_ref().is_some_and(|w| w.in_range(distance))
    }
}
