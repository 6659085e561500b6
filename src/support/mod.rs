//! Support bonds: point growth, rank unlocks and combat bonuses

pub mod bonus;
pub mod book;
pub mod pair;

pub use bonus::CombatBonus;
pub use book::{RankEarned, SupportBook, RANGE_ANYWHERE, RANGE_OVERLAP};
pub use pair::SupportPair;
