//! What the selected unit does after moving

use derive_more::Display;
use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::{TilePos, UnitId};
use crate::data::WinCondition;
use crate::event::GameSignal;
use crate::map::{targets_from, GameBoard, RegionKind};
use crate::render::{draw_menu, Surface};
use crate::state::context::ChapterOutcome;
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::{adjacent_units, selected_on_board, step_menu};
use crate::state::{GameContext, StateName};
use crate::units::Unit;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Attack,
    Item,
    Trade,
    Rescue,
    Drop,
    Visit,
    Shop,
    Seize,
    Talk,
    Support,
    Wait,
}

#[derive(Debug, Default)]
pub struct ActionMenu {
    options: Vec<MenuOption>,
    selected: usize,
    talk_partner: Option<UnitId>,
    support_partner: Option<UnitId>,
}

/// Some free tile next to `pos` the carried unit could stand on
pub(crate) fn drop_tiles(ctx: &GameContext, carrier: &Unit) -> Vec<TilePos> {
    let (Some(board), Some(pos), Some(carried)) = (
        ctx.board.as_ref(),
        carrier.position,
        carrier.carried_unit().and_then(|id| ctx.unit(id)),
    ) else {
        return Vec::new();
    };
    let group = ctx.db.movement_group(&carried.class_id);
    pos.neighbors()
        .into_iter()
        .filter(|p| !board.is_occupied(*p) && board.movement_cost(*p, group, &ctx.db).is_some())
        .collect()
}

/// Adjacent allies `rescuer` may pick up: free-handed and lighter
pub(crate) fn rescue_partners<'a>(ctx: &'a GameContext, board: &'a GameBoard, rescuer: &'a Unit) -> Vec<&'a Unit> {
    let Some(pos) = rescuer.position else {
        return Vec::new();
    };
    if rescuer.carried_unit().is_some() {
        return Vec::new();
    }
    adjacent_units(board, pos)
        .filter(|u| ctx.db.are_allied(&rescuer.team, &u.team))
        .filter(|u| u.carried_unit().is_none())
        .filter(|u| u.stats.constitution < rescuer.stats.constitution)
        .collect()
}

/// Adjacent allies to trade with; someone must hold an item
pub(crate) fn trade_partners<'a>(board: &'a GameBoard, unit: &'a Unit) -> Vec<&'a Unit> {
    let Some(pos) = unit.position else {
        return Vec::new();
    };
    adjacent_units(board, pos)
        .filter(|u| u.team == unit.team)
        .filter(|u| !u.items.is_empty() || !unit.items.is_empty())
        .collect()
}

impl ActionMenu {
    fn build_options(&mut self, ctx: &GameContext, unit: &Unit, pos: TilePos) {
        self.options.clear();
        self.talk_partner = None;
        self.support_partner = None;
        let Some(board) = ctx.board.as_ref() else {
            return;
        };

        if !unit.flags.attacked && !targets_from(board, &ctx.db, unit, pos).is_empty() {
            self.options.push(MenuOption::Attack);
        }
        if unit.has_usable_item() {
            self.options.push(MenuOption::Item);
        }
        if !trade_partners(board, unit).is_empty() {
            self.options.push(MenuOption::Trade);
        }
        if !rescue_partners(ctx, board, unit).is_empty() {
            self.options.push(MenuOption::Rescue);
        }
        if !drop_tiles(ctx, unit).is_empty() {
            self.options.push(MenuOption::Drop);
        }

        if let Some(region) = board.region_at(pos) {
            match region.kind {
                RegionKind::Visit => self.options.push(MenuOption::Visit),
                RegionKind::Shop => self.options.push(MenuOption::Shop),
                RegionKind::Seize => {
                    let is_lord = match &ctx.rules.lord {
                        Some(lord) => lord == &unit.id,
                        None => unit.team == *ctx.player_team(),
                    };
                    if ctx.rules.win == WinCondition::Seize && is_lord {
                        self.options.push(MenuOption::Seize);
                    }
                }
            }
        }

        self.talk_partner = adjacent_units(board, pos)
            .find(|other| ctx.rules.talks.iter().any(|t| t.matches(&unit.id, &other.id)))
            .map(|other| other.id.clone());
        if self.talk_partner.is_some() {
            self.options.push(MenuOption::Talk);
        }
        self.support_partner = adjacent_units(board, pos)
            .find(|other| ctx.support.can_support(&ctx.db, &unit.id, &other.id))
            .map(|other| other.id.clone());
        if self.support_partner.is_some() {
            self.options.push(MenuOption::Support);
        }

        self.options.push(MenuOption::Wait);
    }

    /// Rebuild the options for the selected unit. False when there is no
    /// unit left to act.
    fn refresh(&mut self, ctx: &mut GameContext) -> bool {
        let Some((id, pos)) = selected_on_board(ctx) else {
            return false;
        };
        let Some(unit) = ctx.unit(&id).filter(|u| !u.flags.finished).cloned() else {
            return false;
        };
        self.build_options(ctx, &unit, pos);
        self.selected = self.selected.min(self.options.len().saturating_sub(1));
        ctx.set_cursor(pos);
        true
    }

    /// Put the unit back where it started its move
    fn undo(&mut self, ctx: &mut GameContext, id: &UnitId) -> Result<()> {
        if let (Some(origin), Some(board)) = (ctx.move_origin, ctx.board.as_mut()) {
            board.move_unit(id, origin)?;
            if let Some(unit) = board.unit_mut(id) {
                unit.flags.moved = false;
            }
            tracing::debug!("{} returns to {:?}", id, origin);
        }
        if let Some(origin) = ctx.move_origin.take() {
            ctx.set_cursor(origin);
        }
        ctx.move_spent = 0;
        ctx.selected_unit = None;
        Ok(())
    }

    fn use_region(&mut self, ctx: &mut GameContext, id: &UnitId, pos: TilePos) {
        let Some(region) = ctx.board.as_ref().and_then(|b| b.region_at(pos)).cloned() else {
            return;
        };
        let signal = region.event.clone().unwrap_or_else(|| region.id.clone());
        tracing::info!("{} uses {:?} region '{}'", id, region.kind, region.id);
        ctx.events.signal(&GameSignal::Region(signal));
        if region.kind == RegionKind::Visit {
            if let Some(board) = ctx.board.as_mut() {
                board.remove_region(&region.id);
            }
        }
    }

    fn choose(&mut self, ctx: &mut GameContext, option: MenuOption, id: UnitId, pos: TilePos) {
        tracing::debug!("{} chose {}", id, option);
        match option {
            MenuOption::Attack => ctx.push(StateName::Targeting),
            MenuOption::Item => ctx.push(StateName::ItemUse),
            MenuOption::Trade => ctx.push(StateName::Trade),
            MenuOption::Rescue => ctx.push(StateName::Rescue),
            MenuOption::Drop => ctx.push(StateName::Drop),
            MenuOption::Visit | MenuOption::Shop => {
                self.use_region(ctx, &id, pos);
                ctx.finish_unit(&id);
                ctx.back();
            }
            MenuOption::Seize => {
                tracing::info!("{} seized the objective", id);
                ctx.outcome = Some(ChapterOutcome::Victory);
                ctx.finish_unit(&id);
                ctx.back();
            }
            MenuOption::Talk => {
                if let Some(partner) = self.talk_partner.take() {
                    ctx.rules.talks.retain(|t| !t.matches(&id, &partner));
                    ctx.events.signal(&GameSignal::Talk(id, partner));
                }
                if !ctx.play_pending_events() {
                    self.refresh(ctx);
                }
            }
            MenuOption::Support => {
                if let Some(partner) = self.support_partner.take() {
                    let next = ctx
                        .support
                        .pair(&id, &partner)
                        .and_then(|p| p.locked_ranks.first().cloned());
                    if let Some(rank) = next {
                        if ctx.support.unlock_rank(&ctx.db, &id, &partner, &rank) {
                            ctx.events.signal(&GameSignal::Support(id, partner, rank));
                        }
                    }
                }
                if !ctx.play_pending_events() {
                    self.refresh(ctx);
                }
            }
            MenuOption::Wait => {
                ctx.finish_unit(&id);
                ctx.back();
            }
        }
    }
}

impl GameState for ActionMenu {
    fn name(&self) -> StateName {
        StateName::ActionMenu
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        if !self.refresh(ctx) {
            ctx.back();
        }
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        if step_menu(&mut self.selected, self.options.len(), input) {
            return Ok(StateResult::Idle);
        }
        let Some((id, pos)) = selected_on_board(ctx) else {
            return Ok(StateResult::Idle);
        };
        match input {
            Some(InputEvent::Select) => {
                if let Some(&option) = self.options.get(self.selected) {
                    self.choose(ctx, option, id, pos);
                }
            }
            Some(InputEvent::Back) => {
                let traded = ctx.unit(&id).is_some_and(|u| u.flags.traded);
                if !traded {
                    self.undo(ctx, &id)?;
                    ctx.back();
                }
            }
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, _ctx: &GameContext) {
        let labels: Vec<String> = self.options.iter().map(|o| o.to_string()).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        draw_menu(surface, Vec2::new(176.0, 8.0), &labels, self.selected);
    }
}
