//! Interactive turn flow: the state machine, its context and the
//! gameplay states

pub mod context;
pub mod input;
pub mod machine;
pub mod phase;
pub mod states;

pub use context::{ChapterOutcome, GameContext, PendingMove, SaveSnapshot};
pub use input::{ClickKind, InputEvent, MouseState};
pub use machine::{GameState, StateCatalog, StateMachine, StateResult, StateStep, Transition};
pub use phase::Phase;
pub use states::default_catalog;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifier of every state the catalog can build
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateName {
    FreeCursor,
    OptionsMenu,
    MoveSelect,
    MovementPlayback,
    ActionMenu,
    Targeting,
    CombatPlayback,
    ItemUse,
    Trade,
    Rescue,
    Drop,
    AiPhase,
    TurnChange,
    PhaseBanner,
    EventPlayback,
    ChapterEnd,
}
