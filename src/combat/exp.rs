//! Experience awards and level-ups

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::rng::roll_growth;
use crate::core::types::UnitId;
use crate::data::Constants;
use crate::units::{Stat, Stats, Unit};

/// EXP earned for one combat. `level_diff` is enemy level minus own level.
pub fn combat_exp(constants: &Constants, level_diff: i32, dealt_damage: bool, killed: bool) -> u32 {
    let mut exp = if dealt_damage {
        ((constants.exp_damage_base + level_diff) / constants.exp_damage_divisor).max(1)
    } else {
        constants.exp_no_damage as i32
    };
    if killed {
        exp += (constants.exp_kill_bonus + constants.exp_level_diff_weight * level_diff).max(0);
    }
    exp.clamp(1, 100) as u32
}

/// Stat gains rolled for one level
pub fn roll_level_up<R: Rng + ?Sized>(constants: &Constants, growths: &Stats, rng: &mut R) -> Stats {
    let mut gains = Stats::default();
    for stat in Stat::ALL {
        gains.set(stat, roll_growth(constants.rng_mode, growths.get(stat), rng));
    }
    gains
}

/// EXP outcome for one unit, computed before anything is applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpAward {
    pub unit: UnitId,
    pub amount: u32,
    pub exp_before: u32,
    pub exp_after: u32,
    pub level_after: u32,
    /// Present when the unit levels up
    pub gains: Option<Stats>,
}

/// Work out EXP and a possible level-up for `unit` without mutating it
pub fn award<R: Rng + ?Sized>(
    constants: &Constants,
    unit: &Unit,
    enemy_level: u32,
    dealt_damage: bool,
    killed: bool,
    rng: &mut R,
) -> Option<ExpAward> {
    if !unit.team.is_player() {
        return None;
    }
    if unit.level >= constants.max_level {
        return Some(ExpAward {
            unit: unit.id.clone(),
            amount: 0,
            exp_before: unit.exp,
            exp_after: 0,
            level_after: unit.level,
            gains: None,
        });
    }

    let level_diff = enemy_level as i32 - unit.level as i32;
    let amount = combat_exp(constants, level_diff, dealt_damage, killed);
    let total = unit.exp + amount;

    let (exp_after, level_after, gains) = if total >= 100 {
        let level = unit.level + 1;
        let exp = if level >= constants.max_level { 0 } else { total - 100 };
        (exp, level, Some(roll_level_up(constants, &unit.growths, rng)))
    } else {
        (total, unit.level, None)
    };

    Some(ExpAward {
        unit: unit.id.clone(),
        amount,
        exp_before: unit.exp,
        exp_after,
        level_after,
        gains,
    })
}

/// Write an award into the unit. A level-up raises current HP with max HP.
pub fn apply_award(unit: &mut Unit, award: &ExpAward) {
    unit.exp = award.exp_after;
    unit.level = award.level_after;
    if let Some(gains) = &award.gains {
        unit.stats.add_all(gains);
        unit.current_hp = (unit.current_hp + gains.hp).min(unit.max_hp());
        tracing::info!("{} reached level {}", unit.name, unit.level);
    }
}
