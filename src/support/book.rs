//! The support book: every bond in the campaign, point growth and bonuses
//!
//! Persists across chapters. Pairs exist only for support prefabs in the
//! database; growth for unknown pairs is ignored.

use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;
use crate::data::{Database, SupportPrefab};
use crate::map::{attackable_tiles, GameBoard};
use crate::support::bonus::CombatBonus;
use crate::support::pair::SupportPair;

/// Range value meaning "anywhere on the map"
pub const RANGE_ANYWHERE: u32 = 99;

/// Range value meaning "overlapping attack ranges"
pub const RANGE_OVERLAP: u32 = 0;

/// A rank newly earned by a pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEarned {
    pub unit_a: UnitId,
    pub unit_b: UnitId,
    pub rank: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportBook {
    pairs: Vec<SupportPair>,
}

impl SupportBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// One empty pair per support prefab
    pub fn from_database(db: &Database) -> Self {
        let mut book = Self::new();
        for prefab in &db.supports {
            book.ensure_pair(&prefab.unit_a, &prefab.unit_b);
        }
        book
    }

    fn ensure_pair(&mut self, a: &UnitId, b: &UnitId) -> &mut SupportPair {
        match self.pairs.iter().position(|p| p.is_pair(a, b)) {
            Some(i) => &mut self.pairs[i],
            None => {
                self.pairs.push(SupportPair::new(a.clone(), b.clone()));
                let last = self.pairs.len() - 1;
                &mut self.pairs[last]
            }
        }
    }

    pub fn pairs(&self) -> &[SupportPair] {
        &self.pairs
    }

    pub fn pair(&self, a: &UnitId, b: &UnitId) -> Option<&SupportPair> {
        self.pairs.iter().find(|p| p.is_pair(a, b))
    }

    pub fn pairs_of<'a>(&'a self, unit: &'a UnitId) -> impl Iterator<Item = &'a SupportPair> + 'a {
        self.pairs.iter().filter(move |p| p.involves(unit))
    }

    fn prefab<'a>(db: &'a Database, pair: &SupportPair) -> Option<&'a SupportPrefab> {
        db.supports
            .iter()
            .find(|s| pair.is_pair(&s.unit_a, &s.unit_b))
    }

    // === RANGE ===

    /// Whether two units count as "near" under a range constant
    ///
    /// 0 compares attack ranges, 1..=98 is Manhattan distance and 99 is
    /// anywhere. Both units must be alive; the first two modes also need
    /// both on the map.
    pub fn within_range(board: &GameBoard, db: &Database, a: &UnitId, b: &UnitId, range: u32) -> bool {
        let (Some(ua), Some(ub)) = (board.unit(a), board.unit(b)) else {
            return false;
        };
        if !ua.is_alive() || !ub.is_alive() {
            return false;
        }
        if range >= RANGE_ANYWHERE {
            return true;
        }
        let (Some(pa), Some(pb)) = (ua.position, ub.position) else {
            return false;
        };
        if range == RANGE_OVERLAP {
            let mine = attackable_tiles(board, db, ua);
            let theirs = attackable_tiles(board, db, ub);
            return !mine.is_disjoint(&theirs);
        }
        pa.distance(&pb) <= range
    }

    // === GROWTH ===

    fn grow(&mut self, db: &Database, index: usize, points: u32) -> Vec<RankEarned> {
        let cap = db.constants.support.chapter_point_cap;
        let pair = &mut self.pairs[index];
        pair.add_points(points, cap);

        let Some(prefab) = Self::prefab(db, pair) else {
            return Vec::new();
        };
        pair.check_thresholds(prefab)
            .into_iter()
            .map(|rank| {
                tracing::info!("Support {} & {} reached rank {}", pair.unit_a, pair.unit_b, rank);
                RankEarned {
                    unit_a: pair.unit_a.clone(),
                    unit_b: pair.unit_b.clone(),
                    rank,
                }
            })
            .collect()
    }

    /// End-of-turn growth for every pair within growth range
    pub fn end_turn(&mut self, board: &GameBoard, db: &Database) -> Vec<RankEarned> {
        let support = &db.constants.support;
        let mut earned = Vec::new();
        for i in 0..self.pairs.len() {
            let (a, b) = (&self.pairs[i].unit_a, &self.pairs[i].unit_b);
            if Self::within_range(board, db, a, b, support.growth_range) {
                earned.extend(self.grow(db, i, support.end_turn_points));
            }
        }
        earned
    }

    /// Growth for the attacker's pairs after a combat
    pub fn end_combat(&mut self, board: &GameBoard, db: &Database, attacker: &UnitId) -> Vec<RankEarned> {
        let support = &db.constants.support;
        let mut earned = Vec::new();
        for i in 0..self.pairs.len() {
            let Some(partner) = self.pairs[i].partner_of(attacker) else {
                continue;
            };
            if Self::within_range(board, db, attacker, partner, support.growth_range) {
                earned.extend(self.grow(db, i, support.combat_points));
            }
        }
        earned
    }

    /// Chapter-end growth regardless of range, then reset the chapter
    /// counters
    pub fn end_chapter(&mut self, board: &GameBoard, db: &Database) -> Vec<RankEarned> {
        let points = db.constants.support.chapter_points;
        let mut earned = Vec::new();
        for i in 0..self.pairs.len() {
            let alive = |id: &UnitId| board.unit(id).is_some_and(|u| u.is_alive());
            if points > 0 && alive(&self.pairs[i].unit_a) && alive(&self.pairs[i].unit_b) {
                earned.extend(self.grow(db, i, points));
            }
        }
        for pair in &mut self.pairs {
            pair.reset_chapter();
        }
        earned
    }

    // === RANKS ===

    fn unlocked_count(&self, unit: &UnitId) -> usize {
        self.pairs_of(unit).map(|p| p.unlocked_ranks.len()).sum()
    }

    fn high_rank_count(&self, db: &Database, unit: &UnitId) -> usize {
        let support = &db.constants.support;
        self.pairs_of(unit)
            .filter(|p| p.unlocked_ranks.iter().any(|r| support.is_high_rank(r)))
            .count()
    }

    fn ally_count(&self, unit: &UnitId) -> usize {
        self.pairs_of(unit)
            .filter(|p| !p.unlocked_ranks.is_empty())
            .count()
    }

    /// Whether the pair may hold a support conversation now
    pub fn can_support(&self, db: &Database, a: &UnitId, b: &UnitId) -> bool {
        let Some(pair) = self.pair(a, b) else {
            return false;
        };
        let Some(next) = pair.locked_ranks.first() else {
            return false;
        };
        let support = &db.constants.support;
        let under = |count: usize, cap: u32| cap == 0 || count < cap as usize;

        if !under(pair.ranks_this_chapter as usize, support.chapter_rank_cap) {
            return false;
        }
        let new_ally = pair.unlocked_ranks.is_empty();
        [&pair.unit_a, &pair.unit_b].into_iter().all(|unit| {
            under(self.unlocked_count(unit), support.total_rank_cap)
                && (!support.is_high_rank(next) || under(self.high_rank_count(db, unit), support.high_rank_cap))
                && (!new_ally || under(self.ally_count(unit), support.ally_cap))
        })
    }

    /// Move `rank` from locked to unlocked. Gated ranks that just opened
    /// are locked in as well.
    pub fn unlock_rank(&mut self, db: &Database, a: &UnitId, b: &UnitId, rank: &str) -> bool {
        let Some(i) = self.pairs.iter().position(|p| p.is_pair(a, b)) else {
            return false;
        };
        if !self.pairs[i].unlock(rank) {
            return false;
        }
        tracing::info!("Support {} & {} unlocked rank {}", a, b, rank);
        if let Some(prefab) = Self::prefab(db, &self.pairs[i]) {
            self.pairs[i].check_thresholds(prefab);
        }
        true
    }

    // === BONUS ===

    /// Total support bonus for `unit` in combat right now
    pub fn bonus(&self, board: &GameBoard, db: &Database, unit: &UnitId) -> CombatBonus {
        let support = &db.constants.support;
        let Some(me) = board.unit(unit) else {
            return CombatBonus::default();
        };
        let personal_affinity = me.affinity.as_deref().and_then(|a| db.affinity(a));

        let mut total = CombatBonus::default();
        let mut allies = 0;
        for pair in self.pairs_of(unit) {
            if support.bonus_ally_cap != 0 && allies >= support.bonus_ally_cap as usize {
                break;
            }
            let Some(rank) = pair.highest_unlocked(support) else {
                continue;
            };
            let Some(partner_id) = pair.partner_of(unit) else {
                continue;
            };
            let Some(partner) = board.unit(partner_id).filter(|p| p.is_alive() && p.is_on_board()) else {
                continue;
            };
            if !Self::within_range(board, db, unit, partner_id, support.bonus_range) {
                continue;
            }

            let pair_bonus = Self::prefab(db, pair)
                .and_then(|prefab| prefab.requirement(rank))
                .and_then(|req| req.bonus)
                .unwrap_or_default();
            let affinity_bonus = |affinity: Option<&crate::data::AffinityDef>| {
                affinity
                    .and_then(|a| a.bonuses.get(rank).copied())
                    .unwrap_or_default()
            };
            let partner_affinity = partner.affinity.as_deref().and_then(|a| db.affinity(a));

            total += pair_bonus
                + CombatBonus::combine(
                    affinity_bonus(personal_affinity),
                    affinity_bonus(partner_affinity),
                    support.bonus_method,
                );
            allies += 1;
        }
        total
    }
}
