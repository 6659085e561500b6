//! Event commands: a type plus positional string arguments
//!
//! Scripts write one command per string, fields separated by `;`:
//! `speak;Eirika;We must hurry.` or `move_unit;seth;4,2`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::types::{Millis, TilePos};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCommand {
    pub kind: String,
    pub args: Vec<String>,
}

impl EventCommand {
    pub fn new(kind: impl Into<String>, args: &[&str]) -> Self {
        Self {
            kind: kind.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn parse(line: &str) -> Self {
        let mut fields = line.split(';').map(str::trim);
        let kind = fields.next().unwrap_or_default().to_string();
        Self {
            kind,
            args: fields.map(String::from).collect(),
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str).filter(|a| !a.is_empty())
    }

    /// Argument parsed as a tile, written `x,y`
    pub fn tile_arg(&self, index: usize) -> Option<TilePos> {
        let (x, y) = self.arg(index)?.split_once(',')?;
        Some(TilePos::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }

    pub fn int_arg(&self, index: usize) -> Option<i32> {
        self.arg(index)?.parse().ok()
    }

    pub fn millis_arg(&self, index: usize) -> Option<Millis> {
        self.arg(index)?.parse().ok()
    }

    pub fn to_line(&self) -> String {
        std::iter::once(self.kind.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl Serialize for EventCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_line())
    }
}

impl<'de> Deserialize<'de> for EventCommand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let line = String::deserialize(deserializer)?;
        Ok(Self::parse(&line))
    }
}

/// How the interpreter treats a command type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Changes game state and advances at once
    Mutator,
    /// Holds the cursor until a dialog closes or a timer runs out
    Blocking,
    /// Presentation only; advances at once
    Skippable,
    Unknown,
}

pub fn classify(kind: &str) -> CommandClass {
    match kind {
        "move_unit" | "remove_unit" | "add_unit" | "give_item" | "remove_item" | "set_current_hp"
        | "change_ai" | "change_team" | "set_game_var" | "win_game" | "lose_game" => CommandClass::Mutator,
        "speak" | "wait" | "transition" => CommandClass::Blocking,
        "add_portrait" | "remove_portrait" | "portrait" | "move_camera" | "center_cursor" | "camera"
        | "screen_shake" | "music" | "sound" | "if" | "elif" | "else" | "end" => CommandClass::Skippable,
        _ => CommandClass::Unknown,
    }
}
