//! Units: the mutable entities that move and fight on the board

use serde::{Deserialize, Serialize};

use crate::core::types::{Team, TilePos, UnitId};
use crate::units::item::{Item, WeaponStats};
use crate::units::stats::{Stat, Stats};
use crate::units::status::StatusEffect;

/// Rescue relation. Stores ids, resolved through the board's unit table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RescueSlot {
    #[default]
    Empty,
    Carrying(UnitId),
    CarriedBy(UnitId),
}

/// Per-turn and lifecycle flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitFlags {
    pub moved: bool,
    pub attacked: bool,
    pub traded: bool,
    pub finished: bool,
    pub dead: bool,
    pub has_canto: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub class_id: String,
    pub level: u32,
    /// 0..100; crossing 100 levels up
    pub exp: u32,
    /// Maximum values (HP here is max HP)
    pub stats: Stats,
    /// Growth rates in percent
    pub growths: Stats,
    pub current_hp: i32,
    pub items: Vec<Item>,
    pub flags: UnitFlags,
    pub rescue: RescueSlot,
    pub affinity: Option<String>,
    pub ai: String,
    /// `None` while carried or off the board
    pub position: Option<TilePos>,
    pub statuses: Vec<StatusEffect>,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, team: Team, class_id: impl Into<String>, stats: Stats) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            team,
            class_id: class_id.into(),
            level: 1,
            exp: 0,
            current_hp: stats.hp,
            stats,
            growths: Stats::default(),
            items: Vec::new(),
            flags: UnitFlags::default(),
            rescue: RescueSlot::Empty,
            affinity: None,
            ai: "none".to_string(),
            position: None,
            statuses: Vec::new(),
        }
    }

    pub fn max_hp(&self) -> i32 {
        self.stats.hp
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        self.stats.get(stat)
    }

    pub fn movement(&self) -> u32 {
        self.stats.movement.max(0) as u32
    }

    pub fn is_alive(&self) -> bool {
        !self.flags.dead
    }

    /// Alive and not yet done for this phase
    pub fn can_act(&self) -> bool {
        !self.flags.dead && !self.flags.finished
    }

    pub fn is_on_board(&self) -> bool {
        self.position.is_some()
    }

    /// Set HP clamped into 0..=max
    pub fn set_hp(&mut self, hp: i32) {
        self.current_hp = hp.clamp(0, self.max_hp());
    }

    pub fn heal(&mut self, amount: i32) {
        self.set_hp(self.current_hp + amount);
    }

    /// Index of the equipped weapon: the first unbroken weapon
    pub fn equipped_index(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.is_weapon() && !item.is_broken())
    }

    pub fn equipped_weapon(&self) -> Option<&Item> {
        self.equipped_index().map(|i| &self.items[i])
    }

    pub fn equipped_stats(&self) -> Option<&WeaponStats> {
        self.equipped_weapon().and_then(|item| item.weapon.as_ref())
    }

    /// Every unbroken weapon the unit carries
    pub fn weapons(&self) -> impl Iterator<Item = &WeaponStats> {
        self.items
            .iter()
            .filter(|item| !item.is_broken())
            .filter_map(|item| item.weapon.as_ref())
    }

    /// Whether any carried weapon reaches `distance`
    pub fn can_reach(&self, distance: u32) -> bool {
        self.weapons().any(|w| w.in_range(distance))
    }

    pub fn has_usable_item(&self) -> bool {
        self.items.iter().any(|item| item.is_usable())
    }

    pub fn carried_unit(&self) -> Option<&UnitId> {
        match &self.rescue {
            RescueSlot::Carrying(id) => Some(id),
            _ => None,
        }
    }

    pub fn carrier(&self) -> Option<&UnitId> {
        match &self.rescue {
            RescueSlot::CarriedBy(id) => Some(id),
            _ => None,
        }
    }

    /// Clear the per-phase flags
    pub fn reset_turn(&mut self) {
        self.flags.moved = false;
        self.flags.attacked = false;
        self.flags.traded = false;
        self.flags.finished = false;
    }

    /// Mark dead: HP to zero and off the board. Board bookkeeping is the
    /// caller's job (`GameBoard::kill_unit`).
    pub fn mark_dead(&mut self) {
        self.current_hp = 0;
        self.flags.dead = true;
        self.flags.finished = true;
        self.position = None;
    }

    /// Remove the item at `index`, returning it
    pub fn take_item(&mut self, index: usize) -> Option<Item> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Drop broken items from the inventory, returning their names
    pub fn discard_broken(&mut self) -> Vec<String> {
        let broken: Vec<String> = self
            .items
            .iter()
            .filter(|item| item.is_broken())
            .map(|item| item.name.clone())
            .collect();
        self.items.retain(|item| !item.is_broken());
        broken
    }
}
