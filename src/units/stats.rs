//! Stat blocks shared by units, growths and stat boosters

use serde::{Deserialize, Serialize};

/// A single named stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stat {
    Hp,
    Str,
    Mag,
    Skl,
    Spd,
    Lck,
    Def,
    Res,
    Con,
    Mov,
}

impl Stat {
    pub const ALL: [Stat; 10] = [
        Stat::Hp,
        Stat::Str,
        Stat::Mag,
        Stat::Skl,
        Stat::Spd,
        Stat::Lck,
        Stat::Def,
        Stat::Res,
        Stat::Con,
        Stat::Mov,
    ];

    pub fn abbrev(&self) -> &'static str {
        match self {
            Stat::Hp => "HP",
            Stat::Str => "STR",
            Stat::Mag => "MAG",
            Stat::Skl => "SKL",
            Stat::Spd => "SPD",
            Stat::Lck => "LCK",
            Stat::Def => "DEF",
            Stat::Res => "RES",
            Stat::Con => "CON",
            Stat::Mov => "MOV",
        }
    }

    pub fn from_abbrev(name: &str) -> Option<Stat> {
        Stat::ALL
            .into_iter()
            .find(|s| s.abbrev().eq_ignore_ascii_case(name))
    }
}

/// Values for every stat. Also used for growth rates (percent) and
/// stat-booster effects, where unset entries are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    #[serde(rename = "HP")]
    pub hp: i32,
    #[serde(rename = "STR")]
    pub strength: i32,
    #[serde(rename = "MAG")]
    pub magic: i32,
    #[serde(rename = "SKL")]
    pub skill: i32,
    #[serde(rename = "SPD")]
    pub speed: i32,
    #[serde(rename = "LCK")]
    pub luck: i32,
    #[serde(rename = "DEF")]
    pub defense: i32,
    #[serde(rename = "RES")]
    pub resistance: i32,
    #[serde(rename = "CON")]
    pub constitution: i32,
    #[serde(rename = "MOV")]
    pub movement: i32,
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Str => self.strength,
            Stat::Mag => self.magic,
            Stat::Skl => self.skill,
            Stat::Spd => self.speed,
            Stat::Lck => self.luck,
            Stat::Def => self.defense,
            Stat::Res => self.resistance,
            Stat::Con => self.constitution,
            Stat::Mov => self.movement,
        }
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Hp => &mut self.hp,
            Stat::Str => &mut self.strength,
            Stat::Mag => &mut self.magic,
            Stat::Skl => &mut self.skill,
            Stat::Spd => &mut self.speed,
            Stat::Lck => &mut self.luck,
            Stat::Def => &mut self.defense,
            Stat::Res => &mut self.resistance,
            Stat::Con => &mut self.constitution,
            Stat::Mov => &mut self.movement,
        }
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        *self.get_mut(stat) = value;
    }

    pub fn add(&mut self, stat: Stat, delta: i32) {
        *self.get_mut(stat) += delta;
    }

    /// Add every entry of `other` to self
    pub fn add_all(&mut self, other: &Stats) {
        for stat in Stat::ALL {
            self.add(stat, other.get(stat));
        }
    }

    /// Nonzero entries, in canonical order
    pub fn nonzero(&self) -> Vec<(Stat, i32)> {
        Stat::ALL
            .into_iter()
            .map(|s| (s, self.get(s)))
            .filter(|(_, v)| *v != 0)
            .collect()
    }

    pub fn is_zero(&self) -> bool {
        self.nonzero().is_empty()
    }
}
