//! Walks a unit along its pending path, one tile per `move_ms_per_tile`

use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::TilePos;
use crate::state::context::PendingMove;
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};

#[derive(Debug, Default)]
pub struct MovementPlayback {
    walk: Option<PendingMove>,
    elapsed: u32,
}

impl MovementPlayback {
    /// Pixel offset of the walker from its board tile
    fn offset(&self, ctx: &GameContext, path: &[TilePos]) -> Vec2 {
        let per_tile = ctx.config.move_ms_per_tile.max(1);
        let step = (self.elapsed / per_tile) as usize;
        let frac = (self.elapsed % per_tile) as f32 / per_tile as f32;
        let (Some(&start), Some(&from)) = (path.first(), path.get(step)) else {
            return Vec2::ZERO;
        };
        let to = path.get(step + 1).copied().unwrap_or(from);
        let ts = ctx.config.tile_size as f32;
        let tile = |p: TilePos| Vec2::new((p.x - start.x) as f32, (p.y - start.y) as f32) * ts;
        tile(from).lerp(tile(to), frac)
    }
}

impl GameState for MovementPlayback {
    fn name(&self) -> StateName {
        StateName::MovementPlayback
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if self.walk.is_some() {
            return Ok(StateResult::Idle);
        }
        match ctx.pending_move.take() {
            Some(walk) => {
                self.elapsed = 0;
                self.walk = Some(walk);
            }
            None => {
                tracing::warn!("Movement playback with nothing to walk");
                ctx.back();
            }
        }
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        let Some(walk) = self.walk.as_ref() else {
            return Ok(StateResult::Idle);
        };
        self.elapsed += ctx.config.frame_ms;

        let steps = walk.path.len().saturating_sub(1) as u32;
        if self.elapsed < steps * ctx.config.move_ms_per_tile {
            let offset = self.offset(ctx, &walk.path);
            ctx.moving = Some((walk.unit.clone(), offset));
            return Ok(StateResult::Idle);
        }

        let Some(walk) = self.walk.take() else {
            return Ok(StateResult::Idle);
        };
        if let Some(&last) = walk.path.last() {
            if let Some(board) = ctx.board.as_mut() {
                board.move_unit(&walk.unit, last)?;
            }
            ctx.set_cursor(last);
        }
        ctx.moving = None;
        if ctx.canto.take().is_some() {
            ctx.finish_unit(&walk.unit);
        }
        ctx.back();
        Ok(StateResult::Idle)
    }

    fn end(&mut self, ctx: &mut GameContext) {
        ctx.moving = None;
    }
}
