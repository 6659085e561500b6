//! One support bond between two units

use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;
use crate::data::{SupportConstants, SupportPrefab};

/// Unordered pair of units and the progress of their bond
///
/// Ranks only ever move from nowhere to `locked` to `unlocked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportPair {
    pub unit_a: UnitId,
    pub unit_b: UnitId,
    pub points: u32,
    /// Ranks earned but not yet seen in conversation
    pub locked_ranks: Vec<String>,
    pub unlocked_ranks: Vec<String>,
    pub points_this_chapter: u32,
    pub ranks_this_chapter: u32,
}

impl SupportPair {
    pub fn new(a: UnitId, b: UnitId) -> Self {
        let (unit_a, unit_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            unit_a,
            unit_b,
            points: 0,
            locked_ranks: Vec::new(),
            unlocked_ranks: Vec::new(),
            points_this_chapter: 0,
            ranks_this_chapter: 0,
        }
    }

    pub fn is_pair(&self, a: &UnitId, b: &UnitId) -> bool {
        (&self.unit_a == a && &self.unit_b == b) || (&self.unit_a == b && &self.unit_b == a)
    }

    pub fn involves(&self, unit: &UnitId) -> bool {
        &self.unit_a == unit || &self.unit_b == unit
    }

    /// The other member of the pair
    pub fn partner_of(&self, unit: &UnitId) -> Option<&UnitId> {
        if &self.unit_a == unit {
            Some(&self.unit_b)
        } else if &self.unit_b == unit {
            Some(&self.unit_a)
        } else {
            None
        }
    }

    pub fn has_rank(&self, rank: &str) -> bool {
        self.locked_ranks.iter().any(|r| r == rank) || self.unlocked_ranks.iter().any(|r| r == rank)
    }

    pub fn is_unlocked(&self, rank: &str) -> bool {
        self.unlocked_ranks.iter().any(|r| r == rank)
    }

    /// Highest unlocked rank by the configured ordering
    pub fn highest_unlocked<'a>(&'a self, constants: &SupportConstants) -> Option<&'a str> {
        self.unlocked_ranks
            .iter()
            .max_by_key(|r| constants.rank_index(r))
            .map(String::as_str)
    }

    /// Add points within the chapter cap. Returns the points actually added.
    pub fn add_points(&mut self, points: u32, chapter_cap: u32) -> u32 {
        let allowed = if chapter_cap == 0 {
            points
        } else {
            points.min(chapter_cap.saturating_sub(self.points_this_chapter))
        };
        self.points += allowed;
        self.points_this_chapter += allowed;
        allowed
    }

    /// Lock every rank whose threshold is met and whose gate is unlocked.
    /// Returns the newly locked ranks.
    pub fn check_thresholds(&mut self, prefab: &SupportPrefab) -> Vec<String> {
        let mut earned = Vec::new();
        for req in &prefab.ranks {
            if self.points < req.requirement || self.has_rank(&req.rank) {
                continue;
            }
            let gate_open = req.gate.as_deref().map_or(true, |gate| self.is_unlocked(gate));
            if gate_open {
                self.locked_ranks.push(req.rank.clone());
                earned.push(req.rank.clone());
            }
        }
        earned
    }

    /// Move a rank from locked to unlocked
    pub fn unlock(&mut self, rank: &str) -> bool {
        let Some(i) = self.locked_ranks.iter().position(|r| r == rank) else {
            return false;
        };
        let rank = self.locked_ranks.remove(i);
        self.unlocked_ranks.push(rank);
        self.ranks_this_chapter += 1;
        true
    }

    pub fn reset_chapter(&mut self) {
        self.points_this_chapter = 0;
        self.ranks_this_chapter = 0;
    }
}
