//! Computer-controlled units
//!
//! Architecture: trait + data
//! - `AiController` is the seam the AI phase calls through
//! - `AiDef` entries in the database say what a unit may do (attack, seek)
//! - `TacticalAi` is the default controller: best attack in reach, else
//!   advance on the nearest enemy, else wait

mod tactical;

pub use tactical::TacticalAi;

use serde::{Deserialize, Serialize};

use crate::core::types::{TilePos, UnitId};
use crate::data::Database;
use crate::map::GameBoard;
use crate::support::SupportBook;

/// What an AI unit does this phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiDecision {
    Attack {
        target: UnitId,
        position: TilePos,
        path: Vec<TilePos>,
        /// Inventory slot of the weapon used
        item: usize,
    },
    Move {
        position: TilePos,
        path: Vec<TilePos>,
    },
    Wait,
}

impl AiDecision {
    /// Path to walk before acting, if any
    pub fn path(&self) -> Option<&[TilePos]> {
        match self {
            AiDecision::Attack { path, .. } | AiDecision::Move { path, .. } => Some(path),
            AiDecision::Wait => None,
        }
    }
}

/// Decision interface for AI-controlled units
pub trait AiController {
    /// Decide for one unit of the acting team. Reads the board only.
    fn decide(&self, board: &GameBoard, db: &Database, support: &SupportBook, unit: &UnitId) -> AiDecision;
}
