pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{EmblemError, Result};
pub use types::{Direction, Millis, Team, TilePos, UnitId};
