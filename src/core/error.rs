use thiserror::Error;

use crate::core::types::{TilePos, UnitId};
use crate::state::StateName;

#[derive(Error, Debug)]
pub enum EmblemError {
    #[error("State not registered in catalog: {0:?}")]
    UnknownState(StateName),

    #[error("State {0:?} requires a loaded level")]
    LevelRequired(StateName),

    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Tile out of bounds: {0:?}")]
    OutOfBounds(TilePos),

    #[error("Content error: {0}")]
    Content(String),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EmblemError>;
