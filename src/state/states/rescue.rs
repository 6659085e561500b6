//! Picking up an adjacent ally and setting a carried one down

use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::{TilePos, UnitId};
use crate::render::{colors, draw_menu, Rect, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::action_menu::{drop_tiles, rescue_partners};
use crate::state::states::{selected_on_board, step_menu};
use crate::state::{GameContext, StateName};
use crate::units::RescueSlot;

/// Choose an adjacent ally to carry
#[derive(Debug, Default)]
pub struct Rescue {
    partners: Vec<UnitId>,
    selected: usize,
}

impl Rescue {
    fn focus(&self, ctx: &mut GameContext) {
        let pos = self.partners.get(self.selected).and_then(|id| ctx.unit(id)).and_then(|u| u.position);
        if let Some(pos) = pos {
            ctx.set_cursor(pos);
        }
    }

    fn rescue(ctx: &mut GameContext, rescuer: &UnitId, partner: &UnitId) {
        let Some(board) = ctx.board.as_mut() else {
            return;
        };
        board.remove_unit(partner);
        if let Some(unit) = board.unit_mut(partner) {
            unit.rescue = RescueSlot::CarriedBy(rescuer.clone());
        }
        if let Some(unit) = board.unit_mut(rescuer) {
            unit.rescue = RescueSlot::Carrying(partner.clone());
        }
        tracing::info!("{} rescued {}", rescuer, partner);
    }
}

impl GameState for Rescue {
    fn name(&self) -> StateName {
        StateName::Rescue
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        self.partners = match (selected_on_board(ctx), ctx.board.as_ref()) {
            (Some((id, _)), Some(board)) => board
                .unit(&id)
                .map(|u| rescue_partners(ctx, board, u).iter().map(|p| p.id.clone()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        if self.partners.is_empty() {
            ctx.back();
            return Ok(StateResult::Idle);
        }
        self.selected = self.selected.min(self.partners.len() - 1);
        self.focus(ctx);
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        if step_menu(&mut self.selected, self.partners.len(), input) {
            self.focus(ctx);
            return Ok(StateResult::Idle);
        }
        match input {
            Some(InputEvent::Select) => {
                let (Some((id, pos)), Some(partner)) = (selected_on_board(ctx), self.partners.get(self.selected)) else {
                    return Ok(StateResult::Idle);
                };
                Self::rescue(ctx, &id, partner);
                ctx.set_cursor(pos);
                ctx.finish_unit(&id);
                ctx.back();
                ctx.back();
            }
            Some(InputEvent::Back) => {
                if let Some((_, pos)) = selected_on_board(ctx) {
                    ctx.set_cursor(pos);
                }
                ctx.back();
            }
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let labels: Vec<String> = self
            .partners
            .iter()
            .map(|id| ctx.unit(id).map_or_else(|| id.to_string(), |u| u.name.clone()))
            .collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        draw_menu(surface, Vec2::new(176.0, 8.0), &labels, self.selected);
    }
}

/// Choose a free adjacent tile to set the carried unit down on
#[derive(Debug, Default)]
pub struct Drop {
    tiles: Vec<TilePos>,
    selected: usize,
}

impl Drop {
    fn drop_at(ctx: &mut GameContext, carrier: &UnitId, tile: TilePos) -> Result<()> {
        let Some(board) = ctx.board.as_mut() else {
            return Ok(());
        };
        let Some(carried) = board.unit(carrier).and_then(|u| u.carried_unit()).cloned() else {
            return Ok(());
        };
        board.set_unit(&carried, tile)?;
        for id in [carrier, &carried] {
            if let Some(unit) = board.unit_mut(id) {
                unit.rescue = RescueSlot::Empty;
            }
        }
        tracing::info!("{} dropped {} at {:?}", carrier, carried, tile);
        Ok(())
    }
}

impl GameState for Drop {
    fn name(&self) -> StateName {
        StateName::Drop
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        self.tiles = ctx.selected().map(|u| drop_tiles(ctx, u)).unwrap_or_default();
        let Some(&tile) = self.tiles.first() else {
            ctx.back();
            return Ok(StateResult::Idle);
        };
        self.selected = 0;
        ctx.set_cursor(tile);
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        if step_menu(&mut self.selected, self.tiles.len(), input) {
            if let Some(&tile) = self.tiles.get(self.selected) {
                ctx.set_cursor(tile);
            }
            return Ok(StateResult::Idle);
        }
        match input {
            Some(InputEvent::Select) => {
                let (Some((id, _)), Some(&tile)) = (selected_on_board(ctx), self.tiles.get(self.selected)) else {
                    return Ok(StateResult::Idle);
                };
                Self::drop_at(ctx, &id, tile)?;
                ctx.finish_unit(&id);
                ctx.back();
                ctx.back();
            }
            Some(InputEvent::Back) => {
                if let Some((_, pos)) = selected_on_board(ctx) {
                    ctx.set_cursor(pos);
                }
                ctx.back();
            }
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        let size = Vec2::splat(ctx.camera.tile_size as f32);
        for (i, tile) in self.tiles.iter().enumerate() {
            let color = if i == self.selected { colors::CURSOR.with_alpha(0.5) } else { colors::MOVE_HIGHLIGHT };
            surface.fill_rect(Rect::at(ctx.camera.tile_to_screen(*tile), size), color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::Team;
    use crate::data::{Constants, Database};
    use crate::map::GameBoard;
    use crate::state::{default_catalog, StateMachine};
    use crate::units::{Stats, Unit};

    fn context() -> GameContext {
        let mut ctx = GameContext::new(Database::new(Constants::default()), EngineConfig::default(), 0);
        let mut board = GameBoard::new(5, 5, "plains");
        let stats = Stats { hp: 10, constitution: 9, movement: 5, ..Stats::default() };
        board.insert_unit(Unit::new("knight", Team::player(), "cavalier", stats));
        board.insert_unit(Unit::new("page", Team::player(), "cleric", Stats { constitution: 4, ..stats }));
        board.insert_unit(Unit::new("brigand", Team::enemy(), "fighter", stats));
        board.set_unit(&"knight".into(), TilePos::new(2, 2)).unwrap();
        board.set_unit(&"page".into(), TilePos::new(2, 3)).unwrap();
        board.set_unit(&"brigand".into(), TilePos::new(4, 4)).unwrap();
        ctx.board = Some(board);
        ctx.selected_unit = Some("knight".into());
        ctx
    }

    fn open(ctx: &mut GameContext, state: StateName) -> StateMachine {
        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::FreeCursor);
        ctx.push(StateName::ActionMenu);
        ctx.push(state);
        machine.run_frame(ctx, None).unwrap();
        machine
    }

    #[test]
    fn test_rescue_links_both_units() {
        let mut ctx = context();
        let mut machine = open(&mut ctx, StateName::Rescue);
        machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();

        assert_eq!(machine.top(), Some(StateName::FreeCursor));
        let knight = ctx.unit(&"knight".into()).unwrap();
        let page = ctx.unit(&"page".into()).unwrap();
        assert_eq!(knight.carried_unit(), Some(&"page".into()));
        assert_eq!(page.carrier(), Some(&"knight".into()));
        assert!(page.position.is_none());
        assert!(knight.flags.finished);
        assert!(ctx.board.as_ref().unwrap().is_consistent());
    }

    #[test]
    fn test_drop_places_carried_unit() {
        let mut ctx = context();
        Rescue::rescue(&mut ctx, &"knight".into(), &"page".into());
        let mut machine = open(&mut ctx, StateName::Drop);
        let tile = ctx.cursor;
        machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();

        let page = ctx.unit(&"page".into()).unwrap();
        assert_eq!(page.position, Some(tile));
        assert_eq!(page.rescue, RescueSlot::Empty);
        assert_eq!(ctx.unit(&"knight".into()).unwrap().rescue, RescueSlot::Empty);
        assert!(ctx.board.as_ref().unwrap().is_consistent());
    }

    #[test]
    fn test_heavier_ally_cannot_be_rescued() {
        let mut ctx = context();
        ctx.selected_unit = Some("page".into());
        let machine = open(&mut ctx, StateName::Rescue);
        assert_eq!(machine.top(), Some(StateName::ActionMenu));
    }
}
