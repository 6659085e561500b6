//! Combat formulas and the pre-battle forecast
//!
//! A `Combatant` is a snapshot of everything the formulas read, so a
//! whole combat can be resolved without touching the board.

use crate::core::error::{EmblemError, Result};
use crate::core::types::{Team, TilePos, UnitId};
use crate::data::{Constants, Database, HitFormula};
use crate::map::GameBoard;
use crate::support::{CombatBonus, SupportBook};
use crate::units::{Stats, WeaponStats};

#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: UnitId,
    pub team: Team,
    pub level: u32,
    pub position: TilePos,
    pub stats: Stats,
    pub hp: i32,
    pub weapon_index: Option<usize>,
    pub weapon: Option<WeaponStats>,
    /// Uses left on the equipped weapon; `None` never breaks
    pub uses: Option<u32>,
    pub terrain_defense: i32,
    pub terrain_avoid: i32,
    pub bonus: CombatBonus,
}

impl Combatant {
    /// Snapshot a unit standing where it is
    pub fn from_board(
        board: &GameBoard,
        db: &Database,
        support: Option<&SupportBook>,
        id: &UnitId,
    ) -> Result<Self> {
        let unit = board.unit(id).ok_or_else(|| EmblemError::UnitNotFound(id.clone()))?;
        let position = unit
            .position
            .ok_or_else(|| EmblemError::Content(format!("unit {} is not on the map", id)))?;
        Self::at(board, db, support, id, position)
    }

    /// Snapshot a unit as if it stood on `position`
    pub fn at(
        board: &GameBoard,
        db: &Database,
        support: Option<&SupportBook>,
        id: &UnitId,
        position: TilePos,
    ) -> Result<Self> {
        let unit = board.unit(id).ok_or_else(|| EmblemError::UnitNotFound(id.clone()))?;
        let weapon_index = unit.equipped_index();
        let equipped = weapon_index.map(|i| &unit.items[i]);
        let (terrain_defense, terrain_avoid) = board.terrain_bonus(position, db);
        let bonus = support
            .map(|book| book.bonus(board, db, id))
            .unwrap_or_default();

        Ok(Self {
            id: id.clone(),
            team: unit.team.clone(),
            level: unit.level,
            position,
            stats: unit.stats,
            hp: unit.current_hp,
            weapon_index,
            weapon: equipped.and_then(|item| item.weapon.clone()),
            uses: equipped.and_then(|item| item.uses),
            terrain_defense,
            terrain_avoid,
            bonus,
        })
    }

    pub fn max_hp(&self) -> i32 {
        self.stats.hp
    }

    pub fn is_armed(&self) -> bool {
        self.weapon.is_some() && self.uses != Some(0)
    }

    /// Armed and the weapon reaches `target`
    pub fn reaches(&self, target: TilePos) -> bool {
        self.is_armed()
            && self
                .weapon
                .as_ref()
                .is_some_and(|w| w.in_range(self.position.distance(&target)))
    }
}

/// Chance in percent that `attacker` hits `defender`
pub fn hit_chance(constants: &Constants, attacker: &Combatant, defender: &Combatant) -> i32 {
    let Some(weapon) = &attacker.weapon else {
        return 0;
    };
    let a = &attacker.stats;
    let d = &defender.stats;
    let (accuracy, avoid) = match constants.hit_formula {
        HitFormula::Standard => (
            weapon.hit + 2 * a.skill + a.luck / 2,
            2 * d.speed + d.luck,
        ),
        HitFormula::Simple => (weapon.hit + a.skill, d.speed),
    };
    let accuracy = accuracy + attacker.bonus.hit_points();
    let avoid = avoid + defender.terrain_avoid + defender.bonus.avoid_points();
    (accuracy - avoid).clamp(0, 100)
}

/// Chance in percent that a hit is critical
pub fn crit_chance(attacker: &Combatant, defender: &Combatant) -> i32 {
    let Some(weapon) = &attacker.weapon else {
        return 0;
    };
    let crit = weapon.crit + attacker.stats.skill / 2 + attacker.bonus.crit_points();
    let dodge = defender.stats.luck + defender.bonus.dodge_points();
    (crit - dodge).clamp(0, 100)
}

/// Damage of a normal (non-critical) hit
pub fn damage(attacker: &Combatant, defender: &Combatant) -> i32 {
    let Some(weapon) = &attacker.weapon else {
        return 0;
    };
    let (power, guard) = if weapon.magic {
        (attacker.stats.magic, defender.stats.resistance)
    } else {
        (attacker.stats.strength, defender.stats.defense)
    };
    let attack = power + weapon.might + attacker.bonus.attack_points();
    let defense = guard + defender.terrain_defense + defender.bonus.defense_points();
    (attack - defense).max(0)
}

/// Whether `attacker` is fast enough to strike twice
pub fn doubles(constants: &Constants, attacker: &Combatant, defender: &Combatant) -> bool {
    attacker.stats.speed - defender.stats.speed >= constants.double_threshold
}

/// One side's numbers in the forecast window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideForecast {
    pub hp: i32,
    pub max_hp: i32,
    pub hit: i32,
    pub damage: i32,
    pub crit: i32,
    /// 0 when this side cannot strike
    pub strikes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatForecast {
    pub attacker: SideForecast,
    pub defender: SideForecast,
}

fn side(constants: &Constants, me: &Combatant, them: &Combatant, can_strike: bool) -> SideForecast {
    let strikes = match (can_strike, doubles(constants, me, them)) {
        (false, _) => 0,
        (true, false) => 1,
        (true, true) => 2,
    };
    SideForecast {
        hp: me.hp,
        max_hp: me.max_hp(),
        hit: hit_chance(constants, me, them),
        damage: damage(me, them),
        crit: crit_chance(me, them),
        strikes,
    }
}

/// Forecast a fight between two snapshots at their given positions
pub fn forecast(constants: &Constants, attacker: &Combatant, defender: &Combatant) -> CombatForecast {
    CombatForecast {
        attacker: side(constants, attacker, defender, attacker.reaches(defender.position)),
        defender: side(constants, defender, attacker, defender.reaches(attacker.position)),
    }
}

impl CombatForecast {
    /// Expected damage the attacker deals, capped at the defender's HP
    pub fn expected_damage(&self, crit_multiplier: i32) -> f32 {
        expected(&self.attacker, crit_multiplier).min(self.defender.hp as f32)
    }

    /// Probability the attacker is still alive afterwards, counting only
    /// plain hits from the defender
    pub fn attacker_survival(&self) -> f32 {
        let enemy = &self.defender;
        if enemy.strikes == 0 || enemy.damage == 0 || enemy.hit == 0 {
            return 1.0;
        }
        let hits_to_kill = (self.attacker.hp + enemy.damage - 1) / enemy.damage;
        if hits_to_kill as u32 > enemy.strikes {
            return 1.0;
        }
        let p = enemy.hit as f32 / 100.0;
        let n = enemy.strikes as i32;
        // P(at least k hits out of n)
        let mut death = 0.0;
        for k in hits_to_kill..=n {
            death += binomial(n, k) * p.powi(k) * (1.0 - p).powi(n - k);
        }
        1.0 - death
    }
}

fn expected(side: &SideForecast, crit_multiplier: i32) -> f32 {
    let hit = side.hit as f32 / 100.0;
    let crit = side.crit as f32 / 100.0;
    let per_hit = side.damage as f32 * (1.0 + crit * (crit_multiplier - 1) as f32);
    hit * per_hit * side.strikes as f32
}

fn binomial(n: i32, k: i32) -> f32 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f32 / (i + 1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> WeaponStats {
        WeaponStats {
            weapon_type: "sword".into(),
            min_range: 1,
            max_range: 1,
            might: 5,
            hit: 90,
            crit: 10,
            weight: 5,
            magic: false,
        }
    }

    fn fighter(id: &str, position: TilePos, stats: Stats) -> Combatant {
        Combatant {
            id: id.into(),
            team: Team::player(),
            level: 1,
            position,
            hp: stats.hp,
            stats,
            weapon_index: Some(0),
            weapon: Some(sword()),
            uses: Some(40),
            terrain_defense: 0,
            terrain_avoid: 0,
            bonus: CombatBonus::default(),
        }
    }

    fn stats(skill: i32, speed: i32, luck: i32) -> Stats {
        Stats {
            hp: 20,
            strength: 6,
            skill,
            speed,
            luck,
            defense: 3,
            ..Stats::default()
        }
    }

    #[test]
    fn test_standard_hit_formula() {
        let constants = Constants::default();
        let a = fighter("a", TilePos::new(0, 0), stats(8, 5, 4));
        let mut d = fighter("d", TilePos::new(1, 0), stats(3, 7, 6));
        // 90 + 16 + 2 - (14 + 6) = 88
        assert_eq!(hit_chance(&constants, &a, &d), 88);

        d.terrain_avoid = 20;
        assert_eq!(hit_chance(&constants, &a, &d), 68);
    }

    #[test]
    fn test_hit_clamped() {
        let constants = Constants::default();
        let a = fighter("a", TilePos::new(0, 0), stats(30, 40, 30));
        let d = fighter("d", TilePos::new(1, 0), stats(0, 0, 0));
        assert_eq!(hit_chance(&constants, &a, &d), 100);
        assert_eq!(hit_chance(&constants, &d, &a), 0);
    }

    #[test]
    fn test_damage_and_terrain() {
        let a = fighter("a", TilePos::new(0, 0), stats(5, 5, 0));
        let mut d = fighter("d", TilePos::new(1, 0), stats(5, 5, 0));
        assert_eq!(damage(&a, &d), 8);
        d.terrain_defense = 10;
        assert_eq!(damage(&a, &d), 0);
    }

    #[test]
    fn test_forecast_double_and_range() {
        let constants = Constants::default();
        let a = fighter("a", TilePos::new(0, 0), stats(5, 10, 0));
        let d = fighter("d", TilePos::new(1, 0), stats(5, 6, 0));
        let fc = forecast(&constants, &a, &d);
        assert_eq!(fc.attacker.strikes, 2);
        assert_eq!(fc.defender.strikes, 1);

        let far = fighter("d", TilePos::new(2, 0), stats(5, 6, 0));
        assert_eq!(forecast(&constants, &a, &far).defender.strikes, 0);
    }

    #[test]
    fn test_survival_probability() {
        let constants = Constants::default();
        let mut a = fighter("a", TilePos::new(0, 0), stats(5, 5, 0));
        a.hp = 5;
        let d = fighter("d", TilePos::new(1, 0), stats(5, 5, 0));
        let fc = forecast(&constants, &a, &d);
        // One strike that kills on a hit
        let p = fc.defender.hit as f32 / 100.0;
        assert!((fc.attacker_survival() - (1.0 - p)).abs() < 1e-5);

        a.hp = 20;
        assert_eq!(forecast(&constants, &a, &d).attacker_survival(), 1.0);
    }
}
