//! Cursor navigation over the map during the player phase

use glam::Vec2;

use crate::core::error::Result;
use crate::render::{colors, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};

#[derive(Debug, Default)]
pub struct FreeCursor;

impl FreeCursor {
    /// Every acting unit is spent
    fn all_finished(ctx: &GameContext) -> bool {
        let Some(board) = ctx.board.as_ref() else {
            return false;
        };
        let team = ctx.acting_team();
        let done = board.team_units(&team).all(|u| u.flags.finished);
        done
    }

    fn select(&mut self, ctx: &mut GameContext) {
        let team = ctx.acting_team();
        let Some(unit) = ctx.board.as_ref().and_then(|b| b.unit_at(ctx.cursor)) else {
            ctx.push(StateName::OptionsMenu);
            return;
        };
        if unit.team == team && unit.can_act() {
            tracing::debug!("Selected {}", unit.id);
            ctx.selected_unit = Some(unit.id.clone());
            ctx.push(StateName::MoveSelect);
        }
    }
}

impl GameState for FreeCursor {
    fn name(&self) -> StateName {
        StateName::FreeCursor
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        ctx.clear_intent();
        if ctx.end_chapter_if_decided() {
            return Ok(StateResult::Idle);
        }
        ctx.play_pending_events();
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        ctx.follow_mouse();
        match input {
            Some(InputEvent::Select) => self.select(ctx),
            Some(InputEvent::Start) => ctx.push(StateName::OptionsMenu),
            Some(other) => {
                if let Some(direction) = other.direction() {
                    ctx.move_cursor(direction);
                }
            }
            None => {}
        }
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if ctx.has_transitions() {
            return Ok(StateResult::Idle);
        }
        if ctx.config.autoend_turn && Self::all_finished(ctx) {
            tracing::debug!("Every {} unit is done; ending the phase", ctx.acting_team());
            ctx.change(StateName::TurnChange);
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let Some(unit) = ctx.board.as_ref().and_then(|b| b.unit_at(ctx.cursor)) else {
            return;
        };
        let label = format!("{}  HP {}/{}", unit.name, unit.current_hp, unit.max_hp());
        surface.text(&label, Vec2::new(4.0, 4.0), colors::WHITE, 8);
    }
}
