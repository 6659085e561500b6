//! Default controller: score every reachable attack, otherwise close in

use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};

use crate::ai::{AiController, AiDecision};
use crate::combat::formulas::{forecast, Combatant};
use crate::core::types::{TilePos, UnitId};
use crate::data::Database;
use crate::map::{find_path, path_cost, reachable, targets_from, truncate_path, GameBoard};
use crate::support::SupportBook;
use crate::units::Unit;

/// Ranking of one (tile, target) option; larger is better
type AttackScore = (OrderedFloat<f32>, OrderedFloat<f32>, Reverse<u32>);

#[derive(Debug, Clone, Copy, Default)]
pub struct TacticalAi;

impl TacticalAi {
    pub fn new() -> Self {
        Self
    }

    fn best_attack(&self, board: &GameBoard, db: &Database, support: &SupportBook, unit: &Unit) -> Option<AiDecision> {
        let item = unit.equipped_index()?;
        let range = reachable(board, db, unit);
        let group = db.movement_group(&unit.class_id);

        let mut best: Option<(AttackScore, TilePos, UnitId)> = None;
        for tile in range.tiles() {
            for target in targets_from(board, db, unit, tile) {
                let Ok(me) = Combatant::at(board, db, Some(support), &unit.id, tile) else {
                    continue;
                };
                let Ok(them) = Combatant::from_board(board, db, Some(support), &target) else {
                    continue;
                };
                let fc = forecast(&db.constants, &me, &them);
                let score = (
                    OrderedFloat(fc.expected_damage(db.constants.crit_multiplier)),
                    OrderedFloat(fc.attacker_survival()),
                    Reverse(range.cost(tile).unwrap_or(u32::MAX)),
                );
                let better = match &best {
                    None => true,
                    Some((current, _, _)) => score.cmp(current) == Ordering::Greater,
                };
                if better {
                    best = Some((score, tile, target));
                }
            }
        }

        let (_, position, target) = best?;
        let path = find_path(board, db, unit, position)?;
        tracing::debug!(
            "AI {} attacks {} from {:?} (cost {})",
            unit.id,
            target,
            position,
            path_cost(board, db, group, &path)
        );
        Some(AiDecision::Attack {
            target,
            position,
            path,
            item,
        })
    }

    fn seek(&self, board: &GameBoard, db: &Database, unit: &Unit) -> Option<AiDecision> {
        let origin = unit.position?;
        let mut enemies: Vec<(u32, TilePos)> = board
            .units()
            .filter(|other| !db.are_allied(&unit.team, &other.team))
            .filter_map(|other| other.position.map(|p| (origin.distance(&p), p)))
            .collect();
        enemies.sort();

        for (_, goal) in enemies {
            let Some(full) = find_path(board, db, unit, goal) else {
                continue;
            };
            let path = truncate_path(board, db, unit, &full, unit.movement());
            let position = *path.last()?;
            if position == origin {
                return None;
            }
            tracing::debug!("AI {} advances toward {:?}, stopping at {:?}", unit.id, goal, position);
            return Some(AiDecision::Move { position, path });
        }
        None
    }
}

impl AiController for TacticalAi {
    fn decide(&self, board: &GameBoard, db: &Database, support: &SupportBook, unit: &UnitId) -> AiDecision {
        let Some(unit) = board.unit(unit).filter(|u| u.is_alive() && u.is_on_board()) else {
            return AiDecision::Wait;
        };
        let Some(def) = db.ai(&unit.ai) else {
            tracing::warn!("Unit {} has unknown AI '{}'; waiting", unit.id, unit.ai);
            return AiDecision::Wait;
        };

        if def.attack {
            if let Some(decision) = self.best_attack(board, db, support, unit) {
                return decision;
            }
        }
        if def.seek {
            if let Some(decision) = self.seek(board, db, unit) {
                return decision;
            }
        }
        AiDecision::Wait
    }
}
