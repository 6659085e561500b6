//! Plays a resolved combat and settles its results
//!
//! Phases run in order, each skipped when it has nothing to show:
//! the scene itself, the death fade (map scenes only; animated scenes
//! fade inside the animation), the EXP bar, the level-up screen, and a
//! one-frame cleanup that writes flags, support points and the chapter
//! outcome before popping.

use glam::Vec2;

use crate::combat::{resolve, CombatRecord, CombatScene, RenderState, Side};
use crate::core::error::Result;
use crate::core::types::{Millis, UnitId};
use crate::render::colors::{self, health_color, Color};
use crate::render::{Rect, Surface};
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatPhase {
    #[default]
    Combat,
    DeathFade,
    Exp,
    LevelUp,
    Cleanup,
}

#[derive(Debug, Default)]
pub struct CombatPlayback {
    scene: Option<CombatScene>,
    phase: CombatPhase,
    elapsed: Millis,
}

/// Width of an HP or EXP bar in pixels
const BAR_WIDTH: f32 = 64.0;

fn draw_bar(surface: &mut dyn Surface, pos: Vec2, fraction: f32, color: Color) {
    let frame = Rect::at(pos, Vec2::new(BAR_WIDTH, 4.0));
    surface.fill_rect(frame, colors::BLACK);
    surface.fill_rect(Rect::at(pos, Vec2::new(BAR_WIDTH * fraction.clamp(0.0, 1.0), 4.0)), color);
}

impl CombatPlayback {
    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    fn record(&self) -> Option<&CombatRecord> {
        self.scene.as_ref().map(CombatScene::record)
    }

    fn enter(&mut self, phase: CombatPhase) {
        tracing::debug!("Combat phase {:?}", phase);
        self.phase = phase;
        self.elapsed = 0;
    }

    /// Board application happens once, between the fade and the EXP bar
    fn apply(&mut self, ctx: &mut GameContext) -> Result<()> {
        let Some(record) = self.record().cloned() else {
            return Ok(());
        };
        if let Some(board) = ctx.board.as_mut() {
            record.apply(board, &ctx.db)?;
        }
        if record.exp.iter().any(|a| a.amount > 0) {
            self.enter(CombatPhase::Exp);
        } else if record.has_level_up() {
            self.enter(CombatPhase::LevelUp);
        } else {
            self.enter(CombatPhase::Cleanup);
        }
        Ok(())
    }

    fn cleanup(&mut self, ctx: &mut GameContext) {
        let Some(attacker) = self.record().map(|r| r.attacker.clone()) else {
            ctx.back();
            return;
        };
        if let Some(unit) = ctx.board.as_mut().and_then(|b| b.unit_mut(&attacker)) {
            unit.flags.attacked = true;
        }
        if let Some(board) = ctx.board.as_ref() {
            for earned in ctx.support.end_combat(board, &ctx.db, &attacker) {
                tracing::info!("Support {} & {} reached rank {}", earned.unit_a, earned.unit_b, earned.rank);
            }
        }
        ctx.check_outcome();
        ctx.combat_target = None;

        match self.canto_budget(ctx, &attacker) {
            Some(remaining) => {
                tracing::debug!("{} may move {} more (Canto)", attacker, remaining);
                ctx.canto = Some(remaining);
                ctx.selected_unit = Some(attacker);
                ctx.back();
                ctx.push(StateName::MoveSelect);
            }
            None => {
                ctx.finish_unit(&attacker);
                ctx.back();
            }
        }
    }

    /// Remaining MOV when the attacker may still Canto. AI-driven units
    /// have nobody to pick the tile, so they finish instead.
    fn canto_budget(&self, ctx: &GameContext, attacker: &UnitId) -> Option<u32> {
        if ctx.outcome.is_some() {
            return None;
        }
        let unit = ctx.unit(attacker)?;
        if ctx.is_ai_controlled(&unit.team) || !unit.flags.has_canto || !unit.is_alive() || !unit.is_on_board() {
            return None;
        }
        let remaining = unit.movement().saturating_sub(ctx.move_spent);
        (remaining > 0).then_some(remaining)
    }

    fn draw_scene(&self, surface: &mut dyn Surface, ctx: &GameContext, state: &RenderState) {
        for platform in &state.platforms {
            surface.fill_rect(Rect::at(*platform + state.shake, Vec2::new(96.0, 8.0)), colors::terrain_color("plains"));
        }
        for side in &state.sides {
            let fallback = side
                .palette
                .first()
                .map(|rgb| Color::from_rgb8(*rgb))
                .unwrap_or(colors::WHITE);
            let color = if side.flash { colors::WHITE } else { fallback };
            let origin = side.position + side.offset + state.shake;
            let rect = Rect::at(origin, Vec2::new(32.0, 48.0));
            match ctx.sprites.get(&format!("combat/{}", side.anim)) {
                Some(handle) => surface.blit_image(handle, origin, side.alpha, side.facing_left),
                None => surface.fill_rect(rect, color.with_alpha(side.alpha)),
            }
            let fraction = side.hp as f32 / side.max_hp.max(1) as f32;
            draw_bar(surface, side.position + Vec2::new(-16.0, 56.0), fraction, health_color(side.hp, side.max_hp));
        }
        for popup in &state.popups {
            let text = match popup.amount {
                Some(amount) => amount.to_string(),
                None => "Miss".to_string(),
            };
            let color = if popup.crit { colors::CURSOR } else { colors::WHITE };
            surface.text(&text, popup.position - Vec2::new(0.0, popup.age as f32 * 0.02), color, 8);
        }
        if state.fade > 0.0 {
            surface.fill(colors::BLACK.with_alpha(state.fade));
        }
    }

    fn draw_map_hud(&self, surface: &mut dyn Surface, ctx: &GameContext, scene: &CombatScene) {
        let record = scene.record();
        for (i, side) in [Side::Attacker, Side::Defender].into_iter().enumerate() {
            let pos = Vec2::new(8.0 + 120.0 * i as f32, 4.0);
            let name = ctx.unit(record.unit(side)).map_or("?", |u| u.name.as_str());
            let hp = scene.displayed_hp(side);
            let max = record.max_hp[side.index()];
            surface.text(&format!("{} {}", name, hp), pos, colors::WHITE, 8);
            draw_bar(surface, pos + Vec2::new(0.0, 10.0), hp as f32 / max.max(1) as f32, health_color(hp, max));
        }
    }
}

impl GameState for CombatPlayback {
    fn name(&self) -> StateName {
        StateName::CombatPlayback
    }

    fn show_map(&self) -> bool {
        !matches!(self.scene, Some(CombatScene::Animated(_)))
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if self.scene.is_some() {
            return Ok(StateResult::Idle);
        }
        let (Some(attacker), Some(defender)) = (ctx.selected_unit.clone(), ctx.combat_target.clone()) else {
            tracing::warn!("Combat without both an attacker and a target");
            ctx.back();
            return Ok(StateResult::Idle);
        };
        let Some(board) = ctx.board.as_ref() else {
            ctx.back();
            return Ok(StateResult::Idle);
        };
        let on_board = |id: &UnitId| board.unit(id).is_some_and(|u| u.is_alive() && u.is_on_board());
        if !on_board(&attacker) || !on_board(&defender) {
            tracing::warn!("Combat between {} and {} needs both on the map", attacker, defender);
            ctx.back();
            return Ok(StateResult::Idle);
        }

        let record = resolve(board, &ctx.db, Some(&ctx.support), &attacker, &defender, &mut ctx.rng)?;
        if record.is_empty() {
            tracing::warn!("{} cannot strike {}; combat cancelled", attacker, defender);
            ctx.back();
            return Ok(StateResult::Idle);
        }
        tracing::info!(
            "Combat {} vs {}: {} strikes, HP {:?} -> {:?}",
            attacker,
            defender,
            record.strikes.len(),
            record.start_hp,
            record.final_hp
        );

        let scene = CombatScene::start(board, &ctx.db, &ctx.config, record);
        scene.write_offsets(&mut ctx.combat_offsets);
        self.scene = Some(scene);
        self.enter(CombatPhase::Combat);
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        let dt = ctx.config.frame_ms;
        match self.phase {
            CombatPhase::Combat => {
                let Some(scene) = self.scene.as_mut() else {
                    ctx.back();
                    return Ok(StateResult::Idle);
                };
                let done = scene.update(dt);
                scene.write_offsets(&mut ctx.combat_offsets);
                if done {
                    ctx.combat_offsets.clear();
                    let map_deaths = matches!(scene, CombatScene::Map(_)) && scene.record().any_dead();
                    if map_deaths {
                        self.enter(CombatPhase::DeathFade);
                    } else {
                        self.apply(ctx)?;
                    }
                }
            }
            CombatPhase::DeathFade => {
                self.elapsed += dt;
                if self.elapsed >= ctx.config.death_fade_ms {
                    self.apply(ctx)?;
                }
            }
            CombatPhase::Exp => {
                self.elapsed += dt;
                if self.elapsed >= ctx.config.exp_bar_ms {
                    let level_up = self.record().is_some_and(CombatRecord::has_level_up);
                    self.enter(if level_up { CombatPhase::LevelUp } else { CombatPhase::Cleanup });
                }
            }
            CombatPhase::LevelUp => {
                self.elapsed += dt;
                if self.elapsed >= ctx.config.level_up_ms {
                    self.enter(CombatPhase::Cleanup);
                }
            }
            CombatPhase::Cleanup => self.cleanup(ctx),
        }
        Ok(StateResult::Idle)
    }

    fn end(&mut self, ctx: &mut GameContext) {
        ctx.combat_offsets.clear();
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        match scene.render_state() {
            Some(state) => self.draw_scene(surface, ctx, state),
            None => self.draw_map_hud(surface, ctx, scene),
        }

        let record = scene.record();
        match self.phase {
            CombatPhase::DeathFade => {
                let alpha = self.elapsed as f32 / ctx.config.death_fade_ms.max(1) as f32;
                let tile = Vec2::splat(ctx.camera.tile_size as f32);
                for side in [Side::Attacker, Side::Defender].into_iter().filter(|s| record.is_dead(*s)) {
                    let pos = ctx.camera.tile_to_screen(record.position(side));
                    surface.fill_rect(Rect::at(pos, tile), colors::WHITE.with_alpha(alpha));
                }
            }
            CombatPhase::Exp => {
                if let Some(award) = record.exp.iter().find(|a| a.amount > 0) {
                    let t = (self.elapsed as f32 / ctx.config.exp_bar_ms.max(1) as f32).min(1.0);
                    let shown = award.exp_before as f32 + award.amount as f32 * t;
                    surface.text("EXP", Vec2::new(60.0, 120.0), colors::WHITE, 8);
                    draw_bar(surface, Vec2::new(84.0, 122.0), (shown % 100.0) / 100.0, colors::CURSOR);
                }
            }
            CombatPhase::LevelUp => {
                if let Some(award) = record.exp.iter().find(|a| a.gains.is_some()) {
                    surface.text(&format!("Level {}!", award.level_after), Vec2::new(80.0, 40.0), colors::CURSOR, 16);
                    if let Some(gains) = &award.gains {
                        for (i, (stat, delta)) in gains.nonzero().into_iter().enumerate() {
                            let pos = Vec2::new(80.0, 64.0 + 10.0 * i as f32);
                            surface.text(&format!("{} +{}", stat.abbrev(), delta), pos, colors::WHITE, 8);
                        }
                    }
                }
            }
            CombatPhase::Combat | CombatPhase::Cleanup => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{Team, TilePos};
    use crate::data::{Constants, Database, RngMode};
    use crate::map::GameBoard;
    use crate::state::{default_catalog, StateMachine};
    use crate::units::{Item, ItemKind, Stats, Unit, WeaponStats};

    fn sword() -> Item {
        Item {
            id: "iron_sword".into(),
            name: "Iron Sword".into(),
            kind: ItemKind::Weapon,
            uses: Some(46),
            weapon: Some(WeaponStats {
                weapon_type: "sword".into(),
                min_range: 1,
                max_range: 1,
                might: 5,
                hit: 100,
                crit: 0,
                weight: 0,
                magic: false,
            }),
            heal: 0,
            stat_effects: Stats::default(),
        }
    }

    fn context(canto: bool) -> GameContext {
        let constants = Constants {
            rng_mode: RngMode::AlwaysHit,
            ..Constants::default()
        };
        let mut ctx = GameContext::new(Database::new(constants), EngineConfig::default(), 3);
        let mut board = GameBoard::new(6, 6, "plains");
        let mut rider = Unit::new("rider", Team::player(), "cavalier", Stats { hp: 20, strength: 5, movement: 7, ..Stats::default() });
        rider.items.push(sword());
        rider.flags.has_canto = canto;
        board.insert_unit(rider);
        board.insert_unit(Unit::new("brigand", Team::enemy(), "fighter", Stats { hp: 30, ..Stats::default() }));
        board.insert_unit(Unit::new("bandit", Team::enemy(), "fighter", Stats { hp: 30, ..Stats::default() }));
        board.set_unit(&"rider".into(), TilePos::new(1, 1)).unwrap();
        board.set_unit(&"brigand".into(), TilePos::new(1, 2)).unwrap();
        board.set_unit(&"bandit".into(), TilePos::new(5, 5)).unwrap();
        ctx.board = Some(board);
        ctx.selected_unit = Some("rider".into());
        ctx.combat_target = Some("brigand".into());
        ctx.move_spent = 3;
        ctx
    }

    fn run(ctx: &mut GameContext, machine: &mut StateMachine, frames: usize) {
        for _ in 0..frames {
            machine.run_frame(ctx, None).unwrap();
        }
    }

    #[test]
    fn test_plays_through_to_cleanup() {
        let mut ctx = context(false);
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::CombatPlayback);
        run(&mut ctx, &mut machine, 300);

        assert!(machine.is_empty());
        assert!(ctx.combat_offsets.is_clear());
        let rider = ctx.unit(&"rider".into()).unwrap();
        assert!(rider.flags.attacked);
        assert!(rider.flags.finished);
        assert_eq!(ctx.unit(&"brigand".into()).unwrap().current_hp, 20);
        assert!(ctx.combat_target.is_none());
    }

    #[test]
    fn test_canto_reenters_move_select() {
        let mut ctx = context(true);
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::CombatPlayback);
        run(&mut ctx, &mut machine, 300);

        assert_eq!(machine.top(), Some(StateName::MoveSelect));
        assert_eq!(ctx.canto, Some(4));
        assert_eq!(ctx.selected_unit, Some("rider".into()));
        assert!(!ctx.unit(&"rider".into()).unwrap().flags.finished);
    }

    #[test]
    fn test_ai_driven_rider_finishes_instead_of_canto() {
        let mut ctx = context(true);
        ctx.config.autoplay = true;
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::CombatPlayback);
        run(&mut ctx, &mut machine, 300);

        assert!(machine.is_empty());
        assert_eq!(ctx.canto, None);
        assert!(ctx.unit(&"rider".into()).unwrap().flags.finished);
    }

    #[test]
    fn test_out_of_reach_pops_without_effect() {
        let mut ctx = context(false);
        ctx.combat_target = Some("bandit".into());
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::CombatPlayback);
        run(&mut ctx, &mut machine, 1);

        assert!(machine.is_empty());
        assert!(!ctx.unit(&"rider".into()).unwrap().flags.attacked);
    }
}
