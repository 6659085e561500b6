//! Animated combat scene
//!
//! Plays a `CombatRecord` as a timed script: fade in, then per strike
//! anticipation, lunge, impact (hit flash, screen shake, damage popup) and
//! recoil, then a death fade and fade out. Every frame produces a
//! `RenderState` the host draws.

use glam::Vec2;

use crate::combat::engine::{CombatRecord, Side};
use crate::combat::offsets::CombatOffsets;
use crate::core::types::{Millis, UnitId};
use crate::data::CombatAnimDef;

/// Logical size of the battle scene
pub const SCENE_SIZE: Vec2 = Vec2::new(240.0, 160.0);

const FADE_MS: Millis = 250;
const POPUP_MS: Millis = 800;
const SHAKE_PIXELS: f32 = 3.0;
const SHAKE_PERIOD_MS: Millis = 32;
/// Scene pixels to map pixels for the sprite nudges
const MAP_SCALE: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    FadeIn,
    Running,
    FadeOut,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Beat {
    FadeIn,
    Anticipation(usize),
    Lunge(usize),
    Impact(usize),
    Recoil(usize),
    DeathFade,
    FadeOut,
    Done,
}

/// Draw data for one combatant
#[derive(Debug, Clone, PartialEq)]
pub struct SideDraw {
    pub unit: UnitId,
    pub anim: String,
    pub palette: Vec<[u8; 3]>,
    pub platform: Option<String>,
    /// Resting position in scene pixels
    pub position: Vec2,
    pub offset: Vec2,
    pub flash: bool,
    pub alpha: f32,
    pub facing_left: bool,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamagePopup {
    pub target: Side,
    /// Damage dealt, `None` for a miss
    pub amount: Option<i32>,
    pub crit: bool,
    pub position: Vec2,
    pub age: Millis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub lifecycle: Lifecycle,
    /// Black overlay opacity
    pub fade: f32,
    pub platforms: [Vec2; 2],
    /// Indexed by `Side::index`
    pub sides: [SideDraw; 2],
    pub popups: Vec<DamagePopup>,
    pub shake: Vec2,
}

/// Per-side content the scene needs besides the record
#[derive(Debug, Clone)]
pub struct SideAssets {
    pub anim: CombatAnimDef,
    pub palette: Vec<[u8; 3]>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnimationCombat {
    record: CombatRecord,
    anims: [CombatAnimDef; 2],
    death_ms: Millis,
    beat: Beat,
    beat_elapsed: Millis,
    state: RenderState,
}

impl AnimationCombat {
    pub fn new(record: CombatRecord, assets: [SideAssets; 2], death_ms: Millis) -> Self {
        let [attacker, defender] = assets;
        let platforms = [
            Vec2::new(SCENE_SIZE.x * 0.7, SCENE_SIZE.y * 0.65),
            Vec2::new(SCENE_SIZE.x * 0.3, SCENE_SIZE.y * 0.65),
        ];
        let draw = |side: Side, assets: &SideAssets| SideDraw {
            unit: record.unit(side).clone(),
            anim: assets.anim.id.clone(),
            palette: assets.palette.clone(),
            platform: assets.platform.clone(),
            position: platforms[side.index()],
            offset: Vec2::ZERO,
            flash: false,
            alpha: 1.0,
            facing_left: side == Side::Attacker,
            hp: record.start_hp[side.index()],
            max_hp: record.max_hp[side.index()],
        };
        let state = RenderState {
            lifecycle: Lifecycle::FadeIn,
            fade: 1.0,
            platforms,
            sides: [draw(Side::Attacker, &attacker), draw(Side::Defender, &defender)],
            popups: Vec::new(),
            shake: Vec2::ZERO,
        };

        Self {
            record,
            anims: [attacker.anim, defender.anim],
            death_ms,
            beat: Beat::FadeIn,
            beat_elapsed: 0,
            state,
        }
    }

    pub fn record(&self) -> &CombatRecord {
        &self.record
    }

    pub fn render_state(&self) -> &RenderState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.beat == Beat::Done
    }

    fn striker(&self, strike: usize) -> Side {
        self.record.strikes[strike].side
    }

    fn duration(&self, beat: Beat) -> Millis {
        let anim = |i: usize| &self.anims[self.striker(i).index()];
        match beat {
            Beat::FadeIn | Beat::FadeOut => FADE_MS,
            Beat::Anticipation(i) => anim(i).anticipation_ms,
            Beat::Lunge(i) => anim(i).lunge_ms,
            Beat::Impact(i) => anim(i).impact_ms,
            Beat::Recoil(i) => anim(i).recoil_ms,
            Beat::DeathFade => self.death_ms,
            Beat::Done => Millis::MAX,
        }
    }

    fn after_strikes(&self) -> Beat {
        if self.record.any_dead() {
            Beat::DeathFade
        } else {
            Beat::FadeOut
        }
    }

    fn next(&self, beat: Beat) -> Beat {
        match beat {
            Beat::FadeIn if self.record.strikes.is_empty() => Beat::FadeOut,
            Beat::FadeIn => Beat::Anticipation(0),
            Beat::Anticipation(i) => Beat::Lunge(i),
            Beat::Lunge(i) => Beat::Impact(i),
            Beat::Impact(i) => Beat::Recoil(i),
            Beat::Recoil(i) if i + 1 < self.record.strikes.len() => Beat::Anticipation(i + 1),
            Beat::Recoil(_) => self.after_strikes(),
            Beat::DeathFade => Beat::FadeOut,
            Beat::FadeOut | Beat::Done => Beat::Done,
        }
    }

    fn enter(&mut self, beat: Beat) {
        if let Beat::Impact(i) = beat {
            let strike = self.record.strikes[i].clone();
            let target = strike.side.other();
            self.state.sides[target.index()].hp = strike.target_hp;
            self.state.popups.push(DamagePopup {
                target,
                amount: strike.hit.then_some(strike.damage),
                crit: strike.crit,
                position: self.state.platforms[target.index()] - Vec2::new(0.0, 32.0),
                age: 0,
            });
        }
    }

    /// Advance the scene. Returns true when it has finished.
    pub fn update(&mut self, dt: Millis) -> bool {
        self.beat_elapsed = self.beat_elapsed.saturating_add(dt);
        while self.beat != Beat::Done && self.beat_elapsed >= self.duration(self.beat) {
            self.beat_elapsed -= self.duration(self.beat);
            self.beat = self.next(self.beat);
            self.enter(self.beat);
        }

        for popup in &mut self.state.popups {
            popup.age = popup.age.saturating_add(dt);
        }
        self.state.popups.retain(|p| p.age < POPUP_MS);

        self.refresh();
        self.is_done()
    }

    fn progress(&self) -> f32 {
        let duration = self.duration(self.beat);
        if duration == 0 || self.beat == Beat::Done {
            1.0
        } else {
            (self.beat_elapsed as f32 / duration as f32).min(1.0)
        }
    }

    fn lunge_vector(&self, side: Side) -> Vec2 {
        let dir = if side == Side::Attacker { -1.0 } else { 1.0 };
        Vec2::new(dir * self.anims[side.index()].lunge_distance, 0.0)
    }

    fn refresh(&mut self) {
        let t = self.progress();
        for side in &mut self.state.sides {
            side.offset = Vec2::ZERO;
            side.flash = false;
        }
        self.state.shake = Vec2::ZERO;

        match self.beat {
            Beat::Lunge(i) => {
                let s = self.striker(i);
                self.state.sides[s.index()].offset = self.lunge_vector(s) * t;
            }
            Beat::Impact(i) => {
                let strike = &self.record.strikes[i];
                let s = strike.side;
                self.state.sides[s.index()].offset = self.lunge_vector(s);
                if strike.hit {
                    self.state.sides[s.other().index()].flash = t < 0.5;
                    let sign = if (self.beat_elapsed / SHAKE_PERIOD_MS) % 2 == 0 { 1.0 } else { -1.0 };
                    let strength = if strike.crit { 2.0 } else { 1.0 };
                    self.state.shake = Vec2::new(sign * SHAKE_PIXELS * strength * (1.0 - t), 0.0);
                }
            }
            Beat::Recoil(i) => {
                let s = self.striker(i);
                self.state.sides[s.index()].offset = self.lunge_vector(s) * (1.0 - t);
            }
            _ => {}
        }

        let faded = matches!(self.beat, Beat::FadeOut | Beat::Done);
        for side in [Side::Attacker, Side::Defender] {
            if self.record.is_dead(side) {
                let alpha = match self.beat {
                    Beat::DeathFade => 1.0 - t,
                    _ if faded => 0.0,
                    _ => 1.0,
                };
                self.state.sides[side.index()].alpha = alpha;
            }
        }

        self.state.fade = match self.beat {
            Beat::FadeIn => 1.0 - t,
            Beat::FadeOut => t,
            Beat::Done => 1.0,
            _ => 0.0,
        };
        self.state.lifecycle = match self.beat {
            Beat::FadeIn => Lifecycle::FadeIn,
            Beat::FadeOut => Lifecycle::FadeOut,
            Beat::Done => Lifecycle::Done,
            _ => Lifecycle::Running,
        };
    }

    /// Mirror the scene's lunge and shake onto the map sprites
    pub fn write_offsets(&self, offsets: &mut CombatOffsets) {
        offsets.clear();
        for side in [Side::Attacker, Side::Defender] {
            let lunge = self.state.sides[side.index()].offset.length();
            if lunge == 0.0 {
                continue;
            }
            let from = self.record.position(side);
            let to = self.record.position(side.other());
            let dir = Vec2::new((to.x - from.x) as f32, (to.y - from.y) as f32).normalize_or_zero();
            offsets.set(self.record.unit(side), dir * lunge * MAP_SCALE);
        }
        offsets.shake = self.state.shake * MAP_SCALE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::engine::Strike;
    use crate::core::types::TilePos;

    fn anim() -> CombatAnimDef {
        CombatAnimDef {
            id: "sword".into(),
            palette: "blue".into(),
            anticipation_ms: 100,
            lunge_ms: 100,
            impact_ms: 100,
            recoil_ms: 100,
            lunge_distance: 20.0,
        }
    }

    fn assets() -> SideAssets {
        SideAssets {
            anim: anim(),
            palette: vec![[0, 0, 255]],
            platform: None,
        }
    }

    fn lethal_record() -> CombatRecord {
        CombatRecord {
            attacker: "a".into(),
            defender: "d".into(),
            attacker_pos: TilePos::new(0, 0),
            defender_pos: TilePos::new(0, 1),
            start_hp: [20, 8],
            max_hp: [20, 8],
            strikes: vec![Strike {
                side: Side::Attacker,
                hit: true,
                crit: false,
                damage: 8,
                target_hp: 0,
            }],
            final_hp: [20, 0],
            dead: [false, true],
            weapon_index: [Some(0), None],
            uses_spent: [1, 0],
            exp: Vec::new(),
        }
    }

    #[test]
    fn test_lifecycle_runs_to_done() {
        let mut scene = AnimationCombat::new(lethal_record(), [assets(), assets()], 500);
        assert_eq!(scene.render_state().lifecycle, Lifecycle::FadeIn);

        scene.update(FADE_MS);
        assert_eq!(scene.render_state().lifecycle, Lifecycle::Running);
        assert_eq!(scene.render_state().fade, 0.0);

        // Anticipation + half the lunge
        scene.update(150);
        let attacker = &scene.render_state().sides[0];
        assert_eq!(attacker.offset, Vec2::new(-10.0, 0.0));

        // Into the impact: HP drops, popup appears, target flashes
        scene.update(60);
        let state = scene.render_state();
        assert_eq!(state.sides[1].hp, 0);
        assert!(state.sides[1].flash);
        assert_eq!(state.popups.len(), 1);
        assert_eq!(state.popups[0].amount, Some(8));
        assert_ne!(state.shake, Vec2::ZERO);

        // Rest of impact, recoil, then halfway through the death fade
        scene.update(90 + 100 + 250);
        let state = scene.render_state();
        assert!((state.sides[1].alpha - 0.5).abs() < 1e-4);
        assert_eq!(state.sides[0].alpha, 1.0);

        assert!(!scene.update(250));
        assert_eq!(scene.render_state().lifecycle, Lifecycle::FadeOut);
        assert!(scene.update(FADE_MS));
        assert_eq!(scene.render_state().lifecycle, Lifecycle::Done);
    }

    #[test]
    fn test_empty_record_only_fades() {
        let mut record = lethal_record();
        record.strikes.clear();
        record.dead = [false, false];
        let mut scene = AnimationCombat::new(record, [assets(), assets()], 500);
        scene.update(FADE_MS);
        assert_eq!(scene.render_state().lifecycle, Lifecycle::FadeOut);
        assert!(scene.update(FADE_MS));
    }

    #[test]
    fn test_map_offsets_follow_lunge() {
        let mut scene = AnimationCombat::new(lethal_record(), [assets(), assets()], 500);
        scene.update(FADE_MS + 100 + 100);
        let mut offsets = CombatOffsets::default();
        scene.write_offsets(&mut offsets);
        // Defender is below the attacker on the map
        let nudge = offsets.offset_of(&"a".into()) - offsets.shake;
        assert!(nudge.y > 0.0);
        assert_eq!(nudge.x, 0.0);
    }
}
