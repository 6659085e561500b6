//! Scripted events: triggers, the pending queue and the interpreter

pub mod command;
pub mod dialog;
pub mod interp;
pub mod trigger;

pub use command::{classify, CommandClass, EventCommand};
pub use dialog::Dialog;
pub use interp::{EventInterp, EventScope};
pub use trigger::{EventDef, EventManager, EventTrigger, GameSignal};
