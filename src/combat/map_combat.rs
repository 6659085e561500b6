//! Minimal-animation combat: strikes shown one after another on the map

use glam::Vec2;

use crate::combat::engine::{CombatRecord, Side, Strike};
use crate::combat::offsets::CombatOffsets;
use crate::core::types::Millis;

/// How far the striker's map sprite leans toward its target
const LEAN_PIXELS: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct MapCombat {
    record: CombatRecord,
    strike_ms: Millis,
    elapsed: Millis,
    /// Strikes whose effect is already shown
    shown: usize,
    hp: [i32; 2],
}

impl MapCombat {
    pub fn new(record: CombatRecord, strike_ms: Millis) -> Self {
        let hp = record.start_hp;
        Self {
            record,
            strike_ms: strike_ms.max(1),
            elapsed: 0,
            shown: 0,
            hp,
        }
    }

    /// The full record at once
    pub fn apply_results(&self) -> &CombatRecord {
        &self.record
    }

    /// Advance playback. Returns true once every strike has been shown.
    pub fn update(&mut self, dt: Millis) -> bool {
        if self.is_done() {
            return true;
        }
        self.elapsed += dt;
        while self.elapsed >= self.strike_ms && !self.is_done() {
            self.elapsed -= self.strike_ms;
            let strike = &self.record.strikes[self.shown];
            self.hp[strike.side.other().index()] = strike.target_hp;
            self.shown += 1;
        }
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.record.strikes.len()
    }

    /// The strike currently playing
    pub fn current_strike(&self) -> Option<&Strike> {
        self.record.strikes.get(self.shown)
    }

    pub fn displayed_hp(&self, side: Side) -> i32 {
        self.hp[side.index()]
    }

    /// Lean the striker toward its target during the first half of a strike
    pub fn write_offsets(&self, offsets: &mut CombatOffsets) {
        offsets.clear();
        let Some(strike) = self.current_strike() else {
            return;
        };
        if self.elapsed * 2 >= self.strike_ms {
            return;
        }
        let from = self.record.position(strike.side);
        let to = self.record.position(strike.side.other());
        let dir = Vec2::new((to.x - from.x) as f32, (to.y - from.y) as f32).normalize_or_zero();
        offsets.set(self.record.unit(strike.side), dir * LEAN_PIXELS);
    }
}
