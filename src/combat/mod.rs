//! Combat: formulas, resolution and the two playback protocols

pub mod animation;
pub mod engine;
pub mod exp;
pub mod formulas;
pub mod map_combat;
pub mod offsets;
pub mod rng;
pub mod scene;

pub use animation::{AnimationCombat, DamagePopup, Lifecycle, RenderState, SideAssets, SideDraw};
pub use engine::{resolve, CombatRecord, Side, Strike};
pub use exp::{apply_award, award, combat_exp, ExpAward};
pub use formulas::{forecast, Combatant, CombatForecast, SideForecast};
pub use map_combat::MapCombat;
pub use offsets::CombatOffsets;
pub use scene::CombatScene;
