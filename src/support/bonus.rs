//! Combat stat bonus granted by support bonds

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::data::BonusMethod;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatBonus {
    pub attack: f32,
    pub defense: f32,
    pub hit: f32,
    pub avoid: f32,
    pub crit: f32,
    /// Reduces the enemy's crit chance
    pub dodge: f32,
}

impl CombatBonus {
    pub fn scale(self, factor: f32) -> Self {
        Self {
            attack: self.attack * factor,
            defense: self.defense * factor,
            hit: self.hit * factor,
            avoid: self.avoid * factor,
            crit: self.crit * factor,
            dodge: self.dodge * factor,
        }
    }

    /// Merge the affinity bonuses of a unit and its partner
    pub fn combine(personal: Self, partner: Self, method: BonusMethod) -> Self {
        match method {
            BonusMethod::Personal => personal,
            BonusMethod::Partner => partner,
            BonusMethod::Mean => (personal + partner).scale(0.5),
            BonusMethod::Sum => personal + partner,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    // Formulas work in whole points
    pub fn attack_points(&self) -> i32 {
        self.attack.round() as i32
    }

    pub fn defense_points(&self) -> i32 {
        self.defense.round() as i32
    }

    pub fn hit_points(&self) -> i32 {
        self.hit.round() as i32
    }

    pub fn avoid_points(&self) -> i32 {
        self.avoid.round() as i32
    }

    pub fn crit_points(&self) -> i32 {
        self.crit.round() as i32
    }

    pub fn dodge_points(&self) -> i32 {
        self.dodge.round() as i32
    }
}

impl Add for CombatBonus {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            attack: self.attack + rhs.attack,
            defense: self.defense + rhs.defense,
            hit: self.hit + rhs.hit,
            avoid: self.avoid + rhs.avoid,
            crit: self.crit + rhs.crit,
            dodge: self.dodge + rhs.dodge,
        }
    }
}

impl AddAssign for CombatBonus {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_methods() {
        let mine = CombatBonus {
            attack: 2.0,
            hit: 10.0,
            ..CombatBonus::default()
        };
        let theirs = CombatBonus {
            attack: 1.0,
            avoid: 5.0,
            ..CombatBonus::default()
        };

        assert_eq!(CombatBonus::combine(mine, theirs, BonusMethod::Personal), mine);
        assert_eq!(CombatBonus::combine(mine, theirs, BonusMethod::Partner), theirs);

        let mean = CombatBonus::combine(mine, theirs, BonusMethod::Mean);
        assert_eq!(mean.attack, 1.5);
        assert_eq!(mean.avoid, 2.5);

        let sum = CombatBonus::combine(mine, theirs, BonusMethod::Sum);
        assert_eq!(sum.attack, 3.0);
        assert_eq!(sum.hit_points(), 10);
    }
}
