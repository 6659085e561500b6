//! Item exchange between the selected unit and an adjacent ally

use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::UnitId;
use crate::map::GameBoard;
use crate::render::{colors, draw_menu, Rect, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::action_menu::trade_partners;
use crate::state::states::{selected_on_board, step_menu};
use crate::state::{GameContext, StateName};

/// Inventory column: 0 is the selected unit, 1 the partner
type Column = usize;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Stage {
    #[default]
    ChoosePartner,
    Items {
        partner: UnitId,
        column: Column,
        row: usize,
        /// Slot picked up by the first confirm
        held: Option<(Column, usize)>,
    },
}

#[derive(Debug, Default)]
pub struct Trade {
    partners: Vec<UnitId>,
    selected: usize,
    stage: Stage,
}

impl Trade {
    fn list_partners(&mut self, ctx: &GameContext) {
        self.partners = match (selected_on_board(ctx), ctx.board.as_ref()) {
            (Some((id, _)), Some(board)) => board
                .unit(&id)
                .map(|unit| trade_partners(board, unit).iter().map(|u| u.id.clone()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        self.selected = self.selected.min(self.partners.len().saturating_sub(1));
    }

    /// Swap two slots, or hand an item over to an empty slot. Returns false
    /// when nothing moved.
    fn exchange(ctx: &mut GameContext, owners: [&UnitId; 2], from: (Column, usize), to: (Column, usize)) -> bool {
        let capacity = ctx.db.constants.inventory_size;
        let Some(board) = ctx.board.as_mut() else {
            return false;
        };
        let len = |board: &GameBoard, column: Column| board.unit(owners[column]).map_or(0, |u| u.items.len());
        let (from_has, to_has) = (from.1 < len(&*board, from.0), to.1 < len(&*board, to.0));
        if !from_has && !to_has {
            return false;
        }
        if from.0 == to.0 {
            // Reordering within one inventory
            let Some(unit) = board.unit_mut(owners[from.0]) else {
                return false;
            };
            if !(from_has && to_has) {
                return false;
            }
            unit.items.swap(from.1, to.1);
            return true;
        }
        if from_has != to_has {
            let receiver = if from_has { to.0 } else { from.0 };
            if len(&*board, receiver) >= capacity {
                tracing::debug!("{} cannot carry more items", owners[receiver]);
                return false;
            }
        }

        let taken_from = board.unit_mut(owners[from.0]).and_then(|u| u.take_item(from.1));
        let taken_to = board.unit_mut(owners[to.0]).and_then(|u| u.take_item(to.1));
        if let (Some(item), Some(unit)) = (taken_to, board.unit_mut(owners[from.0])) {
            let at = from.1.min(unit.items.len());
            unit.items.insert(at, item);
        }
        if let (Some(item), Some(unit)) = (taken_from, board.unit_mut(owners[to.0])) {
            let at = to.1.min(unit.items.len());
            unit.items.insert(at, item);
        }
        for owner in owners {
            if let Some(unit) = board.unit_mut(owner) {
                unit.flags.traded = true;
            }
        }
        true
    }

    fn items_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext, id: UnitId) {
        let capacity = ctx.db.constants.inventory_size.max(1);
        let Stage::Items { partner, column, row, held } = &mut self.stage else {
            return;
        };
        match input {
            Some(InputEvent::Up) => *row = (*row + capacity - 1) % capacity,
            Some(InputEvent::Down) => *row = (*row + 1) % capacity,
            Some(InputEvent::Left) | Some(InputEvent::Right) => *column = 1 - *column,
            Some(InputEvent::Select) => match held.take() {
                None => *held = Some((*column, *row)),
                Some(from) => {
                    let partner = partner.clone();
                    if Self::exchange(ctx, [&id, &partner], from, (*column, *row)) {
                        tracing::info!("{} traded with {}", id, partner);
                    }
                }
            },
            Some(InputEvent::Back) => {
                if held.take().is_none() {
                    self.stage = Stage::ChoosePartner;
                    self.list_partners(ctx);
                }
            }
            _ => {}
        }
    }
}

impl GameState for Trade {
    fn name(&self) -> StateName {
        StateName::Trade
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        self.list_partners(ctx);
        if self.partners.is_empty() {
            tracing::warn!("Trade opened with no partner in reach");
            ctx.back();
        }
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        let Some((id, _)) = selected_on_board(ctx) else {
            ctx.back();
            return Ok(StateResult::Idle);
        };
        if self.stage != Stage::ChoosePartner {
            self.items_input(input, ctx, id);
            return Ok(StateResult::Idle);
        }

        if step_menu(&mut self.selected, self.partners.len(), input) {
            return Ok(StateResult::Idle);
        }
        match input {
            Some(InputEvent::Select) => {
                if let Some(partner) = self.partners.get(self.selected).cloned() {
                    self.stage = Stage::Items { partner, column: 0, row: 0, held: None };
                }
            }
            // ActionMenu rebuilds its options when it resumes
            Some(InputEvent::Back) => ctx.back(),
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let Stage::Items { partner, column, row, held } = &self.stage else {
            let labels: Vec<String> = self
                .partners
                .iter()
                .map(|id| ctx.unit(id).map_or_else(|| id.to_string(), |u| u.name.clone()))
                .collect();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            draw_menu(surface, Vec2::new(176.0, 8.0), &labels, self.selected);
            return;
        };

        let Some(own) = ctx.selected_unit.as_ref() else {
            return;
        };
        let rows = ctx.db.constants.inventory_size;
        for (side, owner) in [own, partner].into_iter().enumerate() {
            let Some(unit) = ctx.unit(owner) else {
                continue;
            };
            let panel = Rect::new(8.0 + side as f32 * 116.0, 24.0, 108.0, 16.0 + rows as f32 * 12.0);
            surface.fill_rect(panel, colors::MENU_BG);
            surface.outline_rect(panel, colors::WHITE);
            surface.text(&unit.name, panel.origin() + Vec2::new(4.0, 2.0), colors::CURSOR, 8);
            for slot in 0..rows {
                let line = panel.origin() + Vec2::new(4.0, 14.0 + slot as f32 * 12.0);
                if side == *column && slot == *row {
                    surface.fill_rect(Rect::at(line, Vec2::new(100.0, 11.0)), colors::MENU_HIGHLIGHT);
                }
                let color = if *held == Some((side, slot)) { colors::CURSOR } else { colors::WHITE };
                let label = unit.items.get(slot).map_or("-", |item| item.name.as_str());
                surface.text(label, line, color, 8);
            }
        }
    }
}
