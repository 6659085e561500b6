//! Units, their stats, items and status effects

pub mod item;
pub mod stats;
pub mod status;
pub mod unit;

pub use item::{Item, ItemKind, WeaponStats};
pub use stats::{Stat, Stats};
pub use status::{tick_statuses, StatusEffect, StatusTick};
pub use unit::{RescueSlot, Unit, UnitFlags};
