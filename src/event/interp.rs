//! Plays one event's command list, one command per frame
//!
//! Each frame: an open dialog gets the frame; otherwise a running wait
//! timer counts down; otherwise the command at the cursor is dispatched.

use ahash::AHashMap;

use crate::core::config::EngineConfig;
use crate::core::types::{Millis, Team, UnitId};
use crate::data::Database;
use crate::event::command::{classify, CommandClass, EventCommand};
use crate::event::dialog::Dialog;
use crate::event::trigger::EventDef;
use crate::map::GameBoard;
use crate::state::{ChapterOutcome, InputEvent};

/// The slice of game state event commands may change
pub struct EventScope<'a> {
    pub board: &'a mut GameBoard,
    pub db: &'a Database,
    pub config: &'a EngineConfig,
    pub vars: &'a mut AHashMap<String, String>,
    pub outcome: &'a mut Option<ChapterOutcome>,
}

#[derive(Debug, Clone)]
pub struct EventInterp {
    pub event_id: String,
    commands: Vec<EventCommand>,
    cursor: usize,
    dialog: Option<Dialog>,
    wait_ms: Millis,
    /// Back was pressed: apply the remaining mutators, skip everything else
    skipping: bool,
}

impl EventInterp {
    pub fn new(def: EventDef) -> Self {
        Self {
            event_id: def.id,
            commands: def.commands,
            cursor: 0,
            dialog: None,
            wait_ms: 0,
            skipping: false,
        }
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn wait_remaining(&self) -> Millis {
        self.wait_ms
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.commands.len() && self.dialog.is_none() && self.wait_ms == 0
    }

    /// Input only matters while a dialog is open
    pub fn take_input(&mut self, input: Option<InputEvent>) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        match input {
            Some(InputEvent::Select) => {
                if dialog.confirm() {
                    self.dialog = None;
                }
            }
            Some(InputEvent::Back) => {
                tracing::debug!("Skipping event '{}'", self.event_id);
                self.dialog = None;
                self.wait_ms = 0;
                self.skipping = true;
            }
            _ => {}
        }
    }

    /// Run one frame. Returns true once the event has finished.
    pub fn update(&mut self, scope: &mut EventScope<'_>, dt: Millis) -> bool {
        if self.skipping {
            while let Some(command) = self.commands.get(self.cursor).cloned() {
                self.cursor += 1;
                if classify(&command.kind) == CommandClass::Mutator {
                    self.mutate_or_warn(&command, scope);
                }
            }
            return true;
        }

        if let Some(dialog) = self.dialog.as_mut() {
            dialog.update();
            return false;
        }
        if self.wait_ms > 0 {
            self.wait_ms = self.wait_ms.saturating_sub(dt);
            return false;
        }
        if let Some(command) = self.commands.get(self.cursor).cloned() {
            self.cursor += 1;
            self.dispatch(&command, scope);
        }
        self.is_finished()
    }

    fn dispatch(&mut self, command: &EventCommand, scope: &mut EventScope<'_>) {
        match classify(&command.kind) {
            CommandClass::Mutator => self.mutate_or_warn(command, scope),
            CommandClass::Blocking => self.block(command, scope.config),
            CommandClass::Skippable => {}
            CommandClass::Unknown => {
                tracing::debug!("Event '{}': unknown command '{}'", self.event_id, command.kind);
            }
        }
    }

    fn block(&mut self, command: &EventCommand, config: &EngineConfig) {
        match command.kind.as_str() {
            "speak" => match (command.arg(0), command.arg(1)) {
                (Some(speaker), Some(text)) => {
                    self.dialog = Some(Dialog::new(speaker, text, config.chars_per_frame));
                }
                _ => self.malformed(command),
            },
            "wait" => match command.millis_arg(0) {
                Some(ms) => self.wait_ms = ms,
                None => self.malformed(command),
            },
            "transition" => self.wait_ms = config.transition_ms,
            _ => {}
        }
    }

    fn malformed(&self, command: &EventCommand) {
        tracing::warn!(
            "Event '{}': malformed command '{}'",
            self.event_id,
            command.to_line()
        );
    }

    fn mutate_or_warn(&self, command: &EventCommand, scope: &mut EventScope<'_>) {
        if mutate(command, scope).is_none() {
            self.malformed(command);
        }
    }
}

fn mutate(command: &EventCommand, scope: &mut EventScope<'_>) -> Option<()> {
    let unit_arg = || command.arg(0).map(UnitId::from);

    match command.kind.as_str() {
        "move_unit" => {
            let id = unit_arg()?;
            let pos = command.tile_arg(1)?;
            // A carried unit is set down where the script puts it
            if scope.board.unit(&id)?.carrier().is_some() {
                scope.board.release_rescue(&id, None, scope.db).ok()?;
            }
            scope.board.move_unit(&id, pos).ok()?;
        }
        "remove_unit" => {
            let id = unit_arg()?;
            let carried = scope.board.unit(&id)?.carrier().is_some();
            let last = scope.board.remove_unit(&id);
            if last.is_none() && !carried {
                return None;
            }
            scope.board.release_rescue(&id, last, scope.db).ok()?;
        }
        "add_unit" => {
            let id = unit_arg()?;
            if scope.board.unit(&id).is_none() {
                // add_unit;id;x,y;prefab;team
                let prefab = command.arg(2)?;
                let team = Team::from(command.arg(3).unwrap_or(Team::ENEMY));
                let unit = scope.db.instantiate_unit(id.clone(), prefab, team).ok()?;
                scope.board.insert_unit(unit);
            }
            let wanted = command.tile_arg(1)?;
            let class = scope.board.unit(&id)?.class_id.clone();
            let group = scope.db.movement_group(&class);
            let pos = scope.board.nearest_free_tile(wanted, group, scope.db)?;
            scope.board.set_unit(&id, pos).ok()?;
        }
        "give_item" => {
            let item = scope.db.item(command.arg(1)?)?.clone();
            let limit = scope.db.constants.inventory_size;
            let unit = scope.board.unit_mut(&unit_arg()?)?;
            if unit.items.len() >= limit {
                tracing::warn!("{} has no room for {}", unit.name, item.name);
                return Some(());
            }
            unit.items.push(item);
        }
        "remove_item" => {
            let item_id = command.arg(1)?;
            let unit = scope.board.unit_mut(&unit_arg()?)?;
            let index = unit.items.iter().position(|i| i.id == item_id)?;
            unit.take_item(index);
        }
        "set_current_hp" => {
            let id = unit_arg()?;
            let hp = command.int_arg(1)?;
            let unit = scope.board.unit_mut(&id)?;
            unit.set_hp(hp);
            if unit.current_hp == 0 && unit.is_alive() {
                scope.board.kill_unit(&id, scope.db).ok()?;
            }
        }
        "change_ai" => {
            let ai = command.arg(1)?.to_string();
            scope.board.unit_mut(&unit_arg()?)?.ai = ai;
        }
        "change_team" => {
            let team = Team::from(command.arg(1)?);
            scope.board.unit_mut(&unit_arg()?)?.team = team;
        }
        "set_game_var" => {
            let name = command.arg(0)?.to_string();
            let value = command.arg(1).unwrap_or("1").to_string();
            scope.vars.insert(name, value);
        }
        "win_game" => *scope.outcome = Some(ChapterOutcome::Victory),
        "lose_game" => *scope.outcome = Some(ChapterOutcome::Defeat),
        _ => return None,
    }
    Some(())
}
