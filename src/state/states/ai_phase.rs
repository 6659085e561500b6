//! Computer-controlled phase: every acting unit decides, walks and fights
//! in turn, with a short pause before each

use std::collections::VecDeque;

use crate::ai::{AiController, AiDecision, TacticalAi};
use crate::core::error::Result;
use crate::core::types::{Millis, UnitId};
use crate::data::DEFAULT_MOVEMENT_GROUP;
use crate::map::path_cost;
use crate::state::context::PendingMove;
use crate::state::machine::{GameState, StateResult};
use crate::state::{GameContext, StateName};

/// Where the current unit is in its turn
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Stage {
    /// Waiting before the next unit acts
    #[default]
    Delay,
    /// Walking; attack `target` on arrival if set
    AfterMove(Option<UnitId>),
    AwaitCombat,
}

#[derive(Debug, Default)]
pub struct AiPhase {
    controller: TacticalAi,
    queue: VecDeque<UnitId>,
    started: bool,
    current: Option<UnitId>,
    stage: Stage,
    elapsed: Millis,
}

impl AiPhase {
    /// Next queued unit still able to act. Units killed since the queue
    /// was built (damage over time, counters) are dropped.
    fn next_unit(&mut self, ctx: &GameContext) -> Option<UnitId> {
        while let Some(id) = self.queue.pop_front() {
            if ctx.unit(&id).is_some_and(|u| u.can_act() && u.is_on_board()) {
                return Some(id);
            }
            tracing::debug!("AI skips {}", id);
        }
        None
    }

    fn done_with_unit(&mut self, ctx: &mut GameContext, id: &UnitId) {
        if ctx.unit(id).is_some_and(|u| u.is_alive() && !u.flags.finished) {
            ctx.finish_unit(id);
        }
        ctx.clear_intent();
        self.current = None;
        self.stage = Stage::Delay;
        self.elapsed = 0;
    }

    fn decide(&mut self, ctx: &mut GameContext, id: UnitId) {
        let decision = match ctx.board.as_ref() {
            Some(board) => self.controller.decide(board, &ctx.db, &ctx.support, &id),
            None => AiDecision::Wait,
        };
        tracing::debug!("AI {} decided {:?}", id, decision);
        if let Some(pos) = ctx.unit(&id).and_then(|u| u.position) {
            ctx.set_cursor(pos);
        }

        let target = match &decision {
            AiDecision::Attack { target, .. } => Some(target.clone()),
            AiDecision::Move { .. } | AiDecision::Wait => None,
        };
        let path = decision.path().map(<[_]>::to_vec).unwrap_or_default();
        if matches!(decision, AiDecision::Wait) {
            self.done_with_unit(ctx, &id);
            return;
        }

        ctx.selected_unit = Some(id.clone());
        self.current = Some(id.clone());
        self.stage = Stage::AfterMove(target);
        if path.len() > 1 {
            let spent = ctx.board.as_ref().map_or(0, |board| {
                let group = board.unit(&id).map_or(DEFAULT_MOVEMENT_GROUP, |u| ctx.db.movement_group(&u.class_id));
                path_cost(board, &ctx.db, group, &path)
            });
            ctx.move_spent = spent;
            if let Some(unit) = ctx.board.as_mut().and_then(|b| b.unit_mut(&id)) {
                unit.flags.moved = true;
            }
            ctx.pending_move = Some(PendingMove { unit: id, path });
            ctx.push(StateName::MovementPlayback);
        } else {
            self.arrive(ctx);
        }
    }

    /// The walk is over: attack if a target was chosen and both still stand
    fn arrive(&mut self, ctx: &mut GameContext) {
        let (Some(id), Stage::AfterMove(target)) = (self.current.clone(), self.stage.clone()) else {
            return;
        };
        let standing = |ctx: &GameContext, id: &UnitId| ctx.unit(id).is_some_and(|u| u.is_alive() && u.is_on_board());
        match target {
            Some(target) if standing(ctx, &id) && standing(ctx, &target) => {
                ctx.selected_unit = Some(id);
                ctx.combat_target = Some(target);
                self.stage = Stage::AwaitCombat;
                ctx.push(StateName::CombatPlayback);
            }
            _ => self.done_with_unit(ctx, &id),
        }
    }
}

impl GameState for AiPhase {
    fn name(&self) -> StateName {
        StateName::AiPhase
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if !self.started {
            self.started = true;
            let team = ctx.acting_team();
            self.queue = ctx
                .board
                .as_ref()
                .map(|b| b.team_unit_ids(&team))
                .unwrap_or_default()
                .into();
            tracing::debug!("AI phase for {} with {} units", team, self.queue.len());
        }
        if ctx.end_chapter_if_decided() || ctx.play_pending_events() {
            return Ok(StateResult::Idle);
        }

        match self.stage {
            Stage::AfterMove(_) => self.arrive(ctx),
            Stage::AwaitCombat => {
                if let Some(id) = self.current.clone() {
                    self.done_with_unit(ctx, &id);
                }
            }
            Stage::Delay => {}
        }
        Ok(StateResult::Idle)
    }

    fn update(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if ctx.has_transitions() || self.stage != Stage::Delay {
            return Ok(StateResult::Idle);
        }
        if ctx.end_chapter_if_decided() || ctx.play_pending_events() {
            return Ok(StateResult::Idle);
        }

        if self.current.is_none() {
            match self.next_unit(ctx) {
                Some(id) => {
                    self.current = Some(id);
                    self.elapsed = 0;
                }
                None => {
                    tracing::debug!("AI phase for {} complete", ctx.acting_team());
                    ctx.change(StateName::TurnChange);
                    return Ok(StateResult::Idle);
                }
            }
        }

        self.elapsed += ctx.config.frame_ms;
        if self.elapsed >= ctx.config.ai_unit_delay_ms {
            if let Some(id) = self.current.clone() {
                self.decide(ctx, id);
            }
        }
        Ok(StateResult::Idle)
    }
}
