//! Content loading: database catalogs, constants and chapter layouts

pub mod constants;
pub mod database;
pub mod level;

pub use constants::{BonusMethod, Constants, HitFormula, RngMode, SupportConstants};
pub use database::{
    AffinityDef, AiDef, ClassDef, CombatAnimDef, Database, PaletteDef, RankRequirement, StatDef,
    SupportPrefab, TerrainDef, UnitPrefab, DEFAULT_MOVEMENT_GROUP, IMPASSABLE,
};
pub use level::{BuiltLevel, ChapterRules, LevelPrefab, LevelUnit, TalkPair, WinCondition};
