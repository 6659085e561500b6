//! Scalar game constants, read from the `[constants]` table of the database
//!
//! Every field has a default so a database may override only what it needs.

use serde::{Deserialize, Serialize};

/// How a displayed hit percentage becomes a yes/no
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngMode {
    /// One roll against the percentage
    Classic,
    /// Average of two rolls (GBA style)
    #[default]
    TrueHit,
    /// Average of three rolls
    TrueHitPlus,
    /// Deterministic: hits at 50% or more
    Fair,
    /// Deterministic: always hits, crits only at 100%
    AlwaysHit,
}

impl RngMode {
    pub fn is_deterministic(&self) -> bool {
        matches!(self, RngMode::Fair | RngMode::AlwaysHit)
    }
}

/// Which accuracy / avoid formula combat uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitFormula {
    /// hit = weapon + 2·SKL + LCK/2, avoid = 2·SPD + LCK
    #[default]
    Standard,
    /// hit = weapon + SKL, avoid = SPD
    Simple,
}

/// How the affinity bonuses of both partners combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMethod {
    /// Only the unit's own affinity
    Personal,
    /// Only the partner's affinity
    Partner,
    /// Average of both
    #[default]
    Mean,
    /// Both added together
    Sum,
}

/// Support bond tuning. Caps of 0 mean "unlimited".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportConstants {
    /// 0 = overlapping attack ranges, 1..=98 = Manhattan distance, 99 = anywhere
    pub growth_range: u32,
    /// Same encoding as `growth_range`, for combat bonuses
    pub bonus_range: u32,
    pub end_turn_points: u32,
    pub combat_points: u32,
    pub chapter_points: u32,
    /// Points a pair may earn per chapter
    pub chapter_point_cap: u32,
    /// Ranks a pair may unlock per chapter
    pub chapter_rank_cap: u32,
    /// Unlocked ranks a unit may hold across all its pairs
    pub total_rank_cap: u32,
    /// Pairs at the highest rank a unit may hold
    pub high_rank_cap: u32,
    /// Distinct partners a unit may bond with
    pub ally_cap: u32,
    /// Partners that contribute to one bonus query
    pub bonus_ally_cap: u32,
    pub bonus_method: BonusMethod,
    /// Ranks in ascending order; the last one is the "high" rank
    pub ranks: Vec<String>,
}

impl Default for SupportConstants {
    fn default() -> Self {
        Self {
            growth_range: 1,
            bonus_range: 3,
            end_turn_points: 1,
            combat_points: 2,
            chapter_points: 0,
            chapter_point_cap: 0,
            chapter_rank_cap: 1,
            total_rank_cap: 0,
            high_rank_cap: 1,
            ally_cap: 5,
            bonus_ally_cap: 0,
            bonus_method: BonusMethod::Mean,
            ranks: vec!["C".into(), "B".into(), "A".into(), "S".into()],
        }
    }
}

impl SupportConstants {
    /// Position of `rank` in the ordering, if known
    pub fn rank_index(&self, rank: &str) -> Option<usize> {
        self.ranks.iter().position(|r| r == rank)
    }

    pub fn is_high_rank(&self, rank: &str) -> bool {
        self.ranks.last().is_some_and(|r| r == rank)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    // === COMBAT ===
    pub crit_multiplier: i32,
    /// Speed lead needed to strike twice
    pub double_threshold: i32,
    pub rng_mode: RngMode,
    pub hit_formula: HitFormula,

    // === EXPERIENCE ===
    /// EXP for a round where the unit dealt no damage
    pub exp_no_damage: u32,
    /// Base of the damage EXP formula `(base + level_diff) / divisor`
    pub exp_damage_base: i32,
    pub exp_damage_divisor: i32,
    /// Flat bonus for a kill
    pub exp_kill_bonus: i32,
    /// Kill bonus per level of difference
    pub exp_level_diff_weight: i32,
    pub max_level: u32,

    // === UNITS ===
    pub inventory_size: usize,

    // === FACTIONS ===
    /// Phase order; the first team is the player
    pub teams: Vec<String>,
    /// Groups of teams that treat each other as allies
    pub alliances: Vec<Vec<String>>,

    pub support: SupportConstants,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            crit_multiplier: 3,
            double_threshold: 4,
            rng_mode: RngMode::TrueHit,
            hit_formula: HitFormula::Standard,

            exp_no_damage: 1,
            exp_damage_base: 31,
            exp_damage_divisor: 3,
            exp_kill_bonus: 20,
            exp_level_diff_weight: 3,
            max_level: 20,

            inventory_size: 5,

            teams: vec!["player".into(), "enemy".into(), "other".into()],
            alliances: vec![vec!["player".into(), "other".into()]],

            support: SupportConstants::default(),
        }
    }
}

impl Constants {
    /// Validate constants for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.crit_multiplier < 1 {
            return Err(format!(
                "crit_multiplier ({}) must be at least 1",
                self.crit_multiplier
            ));
        }

        if self.exp_damage_divisor <= 0 {
            return Err("exp_damage_divisor must be positive".into());
        }

        if self.teams.first().map(String::as_str) != Some("player") {
            return Err("team order must start with \"player\"".into());
        }

        if self.support.ranks.is_empty() {
            return Err("support ranks must not be empty".into());
        }

        Ok(())
    }
}
