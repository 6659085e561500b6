//! Phase hand-over and the banner that opens each phase

use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::{Millis, Team, UnitId};
use crate::event::GameSignal;
use crate::render::colors::{self, team_color};
use crate::render::{Rect, Surface};
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};
use crate::units::tick_statuses;

/// Ends the current phase and starts the next one
#[derive(Debug, Default)]
pub struct TurnChange;

impl GameState for TurnChange {
    fn name(&self) -> StateName {
        StateName::TurnChange
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if ctx.phase.has_started() && ctx.phase.is_player_phase() {
            if let Some(board) = ctx.board.as_ref() {
                for earned in ctx.support.end_turn(board, &ctx.db) {
                    tracing::info!("Support {} & {} reached rank {}", earned.unit_a, earned.unit_b, earned.rank);
                }
            }
        }

        let board = ctx.board.as_ref();
        ctx.phase.advance(|team| board.is_some_and(|b| b.living_team_units(team).next().is_some()));
        ctx.clear_intent();
        let team = ctx.acting_team();
        tracing::info!("Turn {}: {} phase", ctx.phase.turn(), team);

        ctx.clear();
        if !ctx.is_ai_controlled(&team) {
            ctx.push(StateName::FreeCursor);
        } else {
            ctx.push(StateName::AiPhase);
        }
        ctx.push(StateName::PhaseBanner);
        Ok(StateResult::Idle)
    }
}

/// Timed "X Phase" banner. Opening the phase resets the team's flags and
/// ticks their status effects.
#[derive(Debug, Default)]
pub struct PhaseBanner {
    opened: bool,
    elapsed: Millis,
}

impl PhaseBanner {
    fn open_phase(&mut self, ctx: &mut GameContext) -> Result<()> {
        let team = ctx.acting_team();
        let Some(board) = ctx.board.as_mut() else {
            return Ok(());
        };
        let ids: Vec<UnitId> = board.living_team_units(&team).map(|u| u.id.clone()).collect();
        let mut dot_deaths = Vec::new();
        for id in &ids {
            let Some(unit) = board.unit_mut(id) else {
                continue;
            };
            unit.reset_turn();
            if unit.statuses.is_empty() {
                continue;
            }
            let tick = tick_statuses(&mut unit.statuses);
            if tick.damage != 0 {
                unit.set_hp(unit.current_hp - tick.damage);
                tracing::debug!("{} takes {} status damage", id, tick.damage);
                if unit.current_hp <= 0 {
                    dot_deaths.push(id.clone());
                }
            }
        }
        for id in dot_deaths {
            tracing::info!("{} succumbed to status damage", id);
            board.kill_unit(&id, &ctx.db)?;
        }

        let turn = ctx.phase.turn();
        ctx.events.signal(&GameSignal::PhaseStart { team, turn });
        ctx.check_outcome();
        Ok(())
    }

    fn label(team: &Team) -> String {
        let mut name = team.as_str().to_string();
        if let Some(first) = name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!("{} Phase", name)
    }
}

impl GameState for PhaseBanner {
    fn name(&self) -> StateName {
        StateName::PhaseBanner
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if !self.opened {
            self.opened = true;
            self.elapsed = 0;
            self.open_phase(ctx)?;
        }
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        self.elapsed += ctx.config.frame_ms;
        if self.elapsed >= ctx.config.phase_banner_ms {
            ctx.back();
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let team = ctx.acting_team();
        let width = (ctx.camera.viewport.0 * ctx.camera.tile_size) as f32;
        let band = Rect::new(0.0, 60.0, width, 28.0);
        surface.fill_rect(band, team_color(&team).darken(0.6).with_alpha(0.85));
        surface.text(&Self::label(&team), Vec2::new(width / 2.0 - 40.0, 66.0), colors::WHITE, 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::TilePos;
    use crate::data::{Constants, Database};
    use crate::map::GameBoard;
    use crate::state::{default_catalog, StateMachine};
    use crate::units::{Stats, StatusEffect, Unit};

    fn context() -> GameContext {
        let mut ctx = GameContext::new(Database::new(Constants::default()), EngineConfig::default(), 0);
        let mut board = GameBoard::new(6, 6, "plains");
        board.insert_unit(Unit::new("hero", Team::player(), "lord", Stats { hp: 20, ..Stats::default() }));
        let mut brigand = Unit::new("brigand", Team::enemy(), "fighter", Stats { hp: 20, ..Stats::default() });
        brigand.current_hp = 3;
        brigand.statuses.push(StatusEffect::new("poison", 5, 3));
        board.insert_unit(brigand);
        board.insert_unit(Unit::new("bandit", Team::enemy(), "fighter", Stats { hp: 20, ..Stats::default() }));
        board.set_unit(&"hero".into(), TilePos::new(0, 0)).unwrap();
        board.set_unit(&"brigand".into(), TilePos::new(5, 5)).unwrap();
        board.set_unit(&"bandit".into(), TilePos::new(5, 4)).unwrap();
        ctx.board = Some(board);
        ctx
    }

    #[test]
    fn test_first_change_opens_player_phase() {
        let mut ctx = context();
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::TurnChange);
        machine.run_frame(&mut ctx, None).unwrap();

        assert_eq!(ctx.phase.turn(), 1);
        assert_eq!(machine.names(), vec![StateName::FreeCursor, StateName::PhaseBanner]);
    }

    #[test]
    fn test_banner_kills_by_status_damage() {
        let mut ctx = context();
        ctx.phase.advance(|_| true);
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::TurnChange);
        machine.run_frame(&mut ctx, None).unwrap();

        assert_eq!(ctx.acting_team(), Team::enemy());
        assert_eq!(machine.names(), vec![StateName::AiPhase, StateName::PhaseBanner]);
        let brigand = ctx.unit(&"brigand".into()).unwrap();
        assert!(!brigand.is_alive());
        assert!(ctx.board.as_ref().unwrap().is_consistent());
    }

    #[test]
    fn test_banner_pops_after_its_time() {
        let mut ctx = context();
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::TurnChange);
        let frames = ctx.config.frames_for(ctx.config.phase_banner_ms);
        for _ in 0..frames {
            machine.run_frame(&mut ctx, None).unwrap();
        }
        assert_eq!(machine.top(), Some(StateName::FreeCursor));
    }

    #[test]
    fn test_banner_label() {
        assert_eq!(PhaseBanner::label(&Team::enemy()), "Enemy Phase");
    }
}
