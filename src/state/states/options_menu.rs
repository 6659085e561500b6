use glam::Vec2;

use crate::core::error::Result;
use crate::render::{draw_menu, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::step_menu;
use crate::state::{GameContext, StateName};

const OPTIONS: [&str; 2] = ["End Turn", "Cancel"];

/// Map menu opened on an empty tile
#[derive(Debug, Default)]
pub struct OptionsMenu {
    selected: usize,
}

impl GameState for OptionsMenu {
    fn name(&self) -> StateName {
        StateName::OptionsMenu
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, _ctx: &mut GameContext) -> Result<StateResult> {
        self.selected = 0;
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        if step_menu(&mut self.selected, OPTIONS.len(), input) {
            return Ok(StateResult::Idle);
        }
        match input {
            Some(InputEvent::Select) if self.selected == 0 => {
                tracing::info!("{} phase ended by the player", ctx.acting_team());
                ctx.back();
                ctx.change(StateName::TurnChange);
            }
            Some(InputEvent::Select) | Some(InputEvent::Back) => ctx.back(),
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, _ctx: &GameContext) {
        draw_menu(surface, Vec2::new(8.0, 8.0), &OPTIONS, self.selected);
    }
}
