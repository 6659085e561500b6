//! Choosing where the selected unit moves
//!
//! Also serves the Canto re-move after an attack: with `ctx.canto` set the
//! range is limited to the remaining MOV, there is no attack silhouette,
//! and backing out ends the unit's turn where it stands.

use std::collections::BTreeSet;

use crate::core::error::Result;
use crate::core::types::{TilePos, UnitId};
use crate::map::{attack_silhouette, find_path, path_cost, reachable, reachable_within, MoveRange};
use crate::render::{colors, Rect, Surface};
use crate::state::context::PendingMove;
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::selected_on_board;
use crate::state::{GameContext, StateName};

#[derive(Debug, Default)]
pub struct MoveSelect {
    unit: Option<UnitId>,
    range: MoveRange,
    attack: BTreeSet<TilePos>,
    canto: bool,
}

impl MoveSelect {
    fn confirm(&mut self, ctx: &mut GameContext, id: UnitId, goal: TilePos) -> Result<()> {
        let (Some(board), Some(unit)) = (ctx.board.as_ref(), ctx.unit(&id)) else {
            return Ok(());
        };
        let Some(path) = find_path(board, &ctx.db, unit, goal) else {
            tracing::warn!("No path for {} to {:?} inside its range", id, goal);
            return Ok(());
        };
        let group = ctx.db.movement_group(&unit.class_id);
        let cost = path_cost(board, &ctx.db, group, &path);
        let origin = unit.position;

        if !self.canto {
            ctx.move_origin = origin;
            ctx.move_spent = cost;
        } else {
            ctx.move_spent += cost;
        }
        if let Some(unit) = ctx.board.as_mut().and_then(|b| b.unit_mut(&id)) {
            unit.flags.moved = true;
        }
        tracing::debug!("{} moves to {:?} (cost {})", id, goal, cost);
        ctx.pending_move = Some(PendingMove { unit: id, path });

        if self.canto {
            ctx.change(StateName::MovementPlayback);
        } else {
            ctx.change(StateName::ActionMenu);
            ctx.push(StateName::MovementPlayback);
        }
        Ok(())
    }

    fn cancel(&mut self, ctx: &mut GameContext, id: UnitId, pos: TilePos) {
        if self.canto {
            ctx.canto = None;
            ctx.finish_unit(&id);
        } else {
            ctx.selected_unit = None;
            ctx.set_cursor(pos);
        }
        ctx.back();
    }
}

impl GameState for MoveSelect {
    fn name(&self) -> StateName {
        StateName::MoveSelect
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        let Some((id, pos)) = selected_on_board(ctx) else {
            tracing::warn!("Move selection without a unit on the board");
            ctx.back();
            return Ok(StateResult::Idle);
        };
        let (Some(board), Some(unit)) = (ctx.board.as_ref(), ctx.unit(&id)) else {
            ctx.back();
            return Ok(StateResult::Idle);
        };

        self.canto = ctx.canto.is_some();
        match ctx.canto {
            Some(remaining) => {
                self.range = reachable_within(board, &ctx.db, unit, remaining);
                self.attack.clear();
            }
            None => {
                self.range = reachable(board, &ctx.db, unit);
                self.attack = attack_silhouette(board, unit, &self.range);
            }
        }
        self.unit = Some(id);
        ctx.set_cursor(pos);
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        ctx.follow_mouse();
        let Some(id) = self.unit.clone() else {
            return Ok(StateResult::Idle);
        };
        match input {
            Some(InputEvent::Select) => {
                let goal = ctx.cursor;
                if self.range.contains(goal) {
                    self.confirm(ctx, id, goal)?;
                }
            }
            Some(InputEvent::Back) => {
                let pos = ctx.unit(&id).and_then(|u| u.position).unwrap_or(ctx.cursor);
                self.cancel(ctx, id, pos);
            }
            Some(other) => {
                if let Some(direction) = other.direction() {
                    ctx.move_cursor(direction);
                }
            }
            None => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let tile = glam::Vec2::splat(ctx.camera.tile_size as f32);
        for pos in self.range.tiles().filter(|p| ctx.camera.is_visible(*p)) {
            surface.fill_rect(Rect::at(ctx.camera.tile_to_screen(pos), tile), colors::MOVE_HIGHLIGHT);
        }
        for pos in self.attack.iter().filter(|p| ctx.camera.is_visible(**p)) {
            surface.fill_rect(Rect::at(ctx.camera.tile_to_screen(*pos), tile), colors::ATTACK_HIGHLIGHT);
        }
    }
}
