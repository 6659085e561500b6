//! Victory or defeat banner that closes a chapter

use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::Millis;
use crate::render::{colors, Rect, Surface};
use crate::state::context::ChapterOutcome;
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};

#[derive(Debug, Default)]
pub struct ChapterEnd {
    settled: bool,
    elapsed: Millis,
}

impl ChapterEnd {
    fn label(outcome: Option<ChapterOutcome>) -> &'static str {
        match outcome {
            Some(ChapterOutcome::Victory) => "Victory",
            Some(ChapterOutcome::Defeat) => "Defeat",
            None => "Chapter End",
        }
    }
}

impl GameState for ChapterEnd {
    fn name(&self) -> StateName {
        StateName::ChapterEnd
    }

    fn in_level(&self) -> bool {
        false
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if self.settled {
            return Ok(StateResult::Idle);
        }
        self.settled = true;
        self.elapsed = 0;
        if let Some(board) = ctx.board.as_ref() {
            for earned in ctx.support.end_chapter(board, &ctx.db) {
                tracing::info!("Support {} & {} reached rank {}", earned.unit_a, earned.unit_b, earned.rank);
            }
        }
        tracing::info!("Chapter over on turn {}: {}", ctx.phase.turn(), Self::label(ctx.outcome));
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        self.elapsed += ctx.config.frame_ms;
        if self.elapsed >= ctx.config.chapter_end_ms {
            ctx.clear();
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let width = (ctx.camera.viewport.0 * ctx.camera.tile_size) as f32;
        let color = match ctx.outcome {
            Some(ChapterOutcome::Defeat) => colors::ATTACK_HIGHLIGHT,
            _ => colors::MENU_HIGHLIGHT,
        };
        surface.fill_rect(Rect::new(0.0, 60.0, width, 28.0), color.with_alpha(0.85));
        surface.text(Self::label(ctx.outcome), Vec2::new(width / 2.0 - 28.0, 66.0), colors::WHITE, 16);
    }
}
