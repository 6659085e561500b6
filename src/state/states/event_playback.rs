//! Plays queued chapter events over the map, one after another

use glam::Vec2;

use crate::core::error::Result;
use crate::event::{EventInterp, EventScope};
use crate::render::{colors, Rect, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};

#[derive(Debug, Default)]
pub struct EventPlayback {
    current: Option<EventInterp>,
}

impl EventPlayback {
    fn load_next(&mut self, ctx: &mut GameContext) -> bool {
        self.current = ctx.events.next_pending().map(|def| {
            tracing::info!("Playing event '{}'", def.id);
            EventInterp::new(def)
        });
        self.current.is_some()
    }
}

impl GameState for EventPlayback {
    fn name(&self) -> StateName {
        StateName::EventPlayback
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if self.current.is_none() && !self.load_next(ctx) {
            ctx.back();
        }
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, _ctx: &mut GameContext) -> Result<StateResult> {
        if let Some(interp) = self.current.as_mut() {
            interp.take_input(input);
        }
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        let (Some(interp), Some(board)) = (self.current.as_mut(), ctx.board.as_mut()) else {
            ctx.back();
            return Ok(StateResult::Idle);
        };
        let mut scope = EventScope {
            board,
            db: &ctx.db,
            config: &ctx.config,
            vars: &mut ctx.vars,
            outcome: &mut ctx.outcome,
        };
        if !interp.update(&mut scope, ctx.config.frame_ms) {
            return Ok(StateResult::Idle);
        }

        tracing::debug!("Event '{}' finished", interp.event_id);
        if !self.load_next(ctx) {
            ctx.back();
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let Some(dialog) = self.current.as_ref().and_then(EventInterp::dialog) else {
            return;
        };
        let width = (ctx.camera.viewport.0 * ctx.camera.tile_size) as f32;
        let height = (ctx.camera.viewport.1 * ctx.camera.tile_size) as f32;
        let panel = Rect::new(4.0, height - 52.0, width - 8.0, 48.0);
        surface.fill_rect(panel, colors::MENU_BG);
        surface.outline_rect(panel, colors::WHITE);
        surface.text(&dialog.speaker, panel.origin() + Vec2::new(6.0, 4.0), colors::CURSOR, 8);
        surface.text(&dialog.visible_text(), panel.origin() + Vec2::new(6.0, 18.0), colors::WHITE, 8);
    }
}
