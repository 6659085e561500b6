//! Picking which enemy to attack, with the battle forecast

use glam::Vec2;

use crate::combat::{forecast, CombatForecast, Combatant};
use crate::core::error::Result;
use crate::core::types::UnitId;
use crate::map::targets_from;
use crate::render::{colors, Rect, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::{selected_on_board, step_menu};
use crate::state::{GameContext, StateName};

#[derive(Debug, Default)]
pub struct Targeting {
    targets: Vec<UnitId>,
    index: usize,
    preview: Option<CombatForecast>,
}

impl Targeting {
    fn focus(&mut self, ctx: &mut GameContext, attacker: &UnitId) {
        let Some(target) = self.targets.get(self.index) else {
            self.preview = None;
            return;
        };
        self.preview = ctx.board.as_ref().and_then(|board| {
            let me = Combatant::from_board(board, &ctx.db, Some(&ctx.support), attacker).ok()?;
            let them = Combatant::from_board(board, &ctx.db, Some(&ctx.support), target).ok()?;
            Some(forecast(&ctx.db.constants, &me, &them))
        });
        if let Some(pos) = ctx.unit(target).and_then(|u| u.position) {
            ctx.set_cursor(pos);
        }
    }
}

impl GameState for Targeting {
    fn name(&self) -> StateName {
        StateName::Targeting
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        let Some((id, pos)) = selected_on_board(ctx) else {
            ctx.back();
            return Ok(StateResult::Idle);
        };
        self.targets = match (ctx.board.as_ref(), ctx.unit(&id)) {
            (Some(board), Some(unit)) => targets_from(board, &ctx.db, unit, pos),
            _ => Vec::new(),
        };
        if self.targets.is_empty() {
            tracing::warn!("{} has nothing to target", id);
            ctx.back();
            return Ok(StateResult::Idle);
        }
        self.index = self.index.min(self.targets.len() - 1);
        self.focus(ctx, &id);
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        let Some((id, pos)) = selected_on_board(ctx) else {
            return Ok(StateResult::Idle);
        };
        if step_menu(&mut self.index, self.targets.len(), input) {
            self.focus(ctx, &id);
            return Ok(StateResult::Idle);
        }
        match input {
            Some(InputEvent::Select) => {
                if let Some(target) = self.targets.get(self.index) {
                    tracing::debug!("{} targets {}", id, target);
                    ctx.combat_target = Some(target.clone());
                    ctx.back();
                    ctx.change(StateName::CombatPlayback);
                }
            }
            Some(InputEvent::Back) => {
                ctx.combat_target = None;
                ctx.set_cursor(pos);
                ctx.back();
            }
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let tile = Vec2::splat(ctx.camera.tile_size as f32);
        if let Some(pos) = self
            .targets
            .get(self.index)
            .and_then(|id| ctx.unit(id))
            .and_then(|u| u.position)
        {
            surface.outline_rect(Rect::at(ctx.camera.tile_to_screen(pos), tile), colors::ATTACK_HIGHLIGHT.with_alpha(1.0));
        }

        let Some(preview) = self.preview else {
            return;
        };
        let panel = Rect::new(4.0, 4.0, 96.0, 60.0);
        surface.fill_rect(panel, colors::MENU_BG);
        surface.outline_rect(panel, colors::WHITE);
        let rows = [
            format!("HP   {:>3} {:>3}", preview.attacker.hp, preview.defender.hp),
            format!("Dmg  {:>3} {:>3}", preview.attacker.damage, preview.defender.damage),
            format!("Hit  {:>3} {:>3}", preview.attacker.hit, preview.defender.hit),
            format!("Crit {:>3} {:>3}", preview.attacker.crit, preview.defender.crit),
        ];
        for (i, row) in rows.iter().enumerate() {
            surface.text(row, Vec2::new(8.0, 8.0 + 13.0 * i as f32), colors::WHITE, 8);
        }
        if preview.attacker.strikes > 1 {
            surface.text("x2", Vec2::new(84.0, 21.0), colors::CURSOR, 8);
        }
    }
}
