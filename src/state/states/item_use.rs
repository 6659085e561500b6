use glam::Vec2;

use crate::core::error::Result;
use crate::render::{draw_menu, Surface};
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateResult};
use crate::state::states::{selected_on_board, step_menu};
use crate::state::{GameContext, StateName};
use crate::units::ItemKind;

/// Picks a usable item from the selected unit's inventory and uses it
#[derive(Debug, Default)]
pub struct ItemUse {
    /// Inventory slots of usable items
    slots: Vec<usize>,
    labels: Vec<String>,
    selected: usize,
}

impl ItemUse {
    fn use_item(&mut self, ctx: &mut GameContext, slot: usize) {
        let Some((id, _)) = selected_on_board(ctx) else {
            return;
        };
        let Some(unit) = ctx.board.as_mut().and_then(|b| b.unit_mut(&id)) else {
            return;
        };
        let Some(item) = unit.items.get(slot).cloned() else {
            return;
        };

        match item.kind {
            ItemKind::Healing => {
                let before = unit.current_hp;
                unit.heal(item.heal);
                tracing::info!("{} used {} (+{} HP)", unit.name, item.name, unit.current_hp - before);
            }
            ItemKind::StatBooster => {
                unit.stats.add_all(&item.stat_effects);
                unit.set_hp(unit.current_hp);
                tracing::info!("{} used {}", unit.name, item.name);
            }
            ItemKind::Consumable | ItemKind::Weapon => {
                tracing::info!("{} used {}", unit.name, item.name);
            }
        }

        let broke = unit.items.get_mut(slot).is_some_and(|i| i.consume_use());
        if broke {
            unit.take_item(slot);
            tracing::debug!("{} was used up", item.name);
        }
        ctx.finish_unit(&id);
        ctx.back();
        ctx.back();
    }
}

impl GameState for ItemUse {
    fn name(&self) -> StateName {
        StateName::ItemUse
    }

    fn transparent(&self) -> bool {
        true
    }

    fn begin(&mut self, ctx: &mut GameContext) -> Result<StateResult> {
        let Some(unit) = selected_on_board(ctx).and_then(|(id, _)| ctx.unit(&id)) else {
            ctx.back();
            return Ok(StateResult::Idle);
        };
        self.slots.clear();
        self.labels.clear();
        for (slot, item) in unit.items.iter().enumerate().filter(|(_, i)| i.is_usable()) {
            self.slots.push(slot);
            let uses = item.uses.map(|u| format!(" {}", u)).unwrap_or_default();
            self.labels.push(format!("{}{}", item.name, uses));
        }
        if self.slots.is_empty() {
            ctx.back();
        }
        self.selected = self.selected.min(self.slots.len().saturating_sub(1));
        Ok(StateResult::Idle)
    }

    fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
        if step_menu(&mut self.selected, self.slots.len(), input) {
            return Ok(StateResult::Idle);
        }
        match input {
            Some(InputEvent::Select) => {
                if let Some(&slot) = self.slots.get(self.selected) {
                    self.use_item(ctx, slot);
                }
            }
            Some(InputEvent::Back) => ctx.back(),
            _ => {}
        }
        Ok(StateResult::Idle)
    }

    fn draw(&self, surface: &mut dyn Surface, _ctx: &GameContext) {
        let labels: Vec<&str> = self.labels.iter().map(String::as_str).collect();
        draw_menu(surface, Vec2::new(96.0, 24.0), &labels, self.selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::{Team, TilePos};
    use crate::data::{Constants, Database};
    use crate::map::GameBoard;
    use crate::state::{default_catalog, StateMachine};
    use crate::units::{Item, Stats, Unit};

    fn vulnerary(uses: u32) -> Item {
        Item {
            id: "vulnerary".into(),
            name: "Vulnerary".into(),
            kind: ItemKind::Healing,
            uses: Some(uses),
            weapon: None,
            heal: 10,
            stat_effects: Stats::default(),
        }
    }

    #[test]
    fn test_last_use_heals_and_discards() {
        let mut ctx = GameContext::new(Database::new(Constants::default()), EngineConfig::default(), 0);
        let mut board = GameBoard::new(4, 4, "plains");
        let mut hero = Unit::new("hero", Team::player(), "lord", Stats { hp: 20, ..Stats::default() });
        hero.current_hp = 5;
        hero.items.push(vulnerary(1));
        board.insert_unit(hero);
        board.insert_unit(Unit::new("brigand", Team::enemy(), "fighter", Stats { hp: 20, ..Stats::default() }));
        board.set_unit(&"hero".into(), TilePos::new(0, 0)).unwrap();
        board.set_unit(&"brigand".into(), TilePos::new(3, 3)).unwrap();
        ctx.board = Some(board);
        ctx.selected_unit = Some("hero".into());

        let mut machine = StateMachine::new(default_catalog());
        ctx.push(StateName::FreeCursor);
        ctx.push(StateName::ActionMenu);
        machine.run_frame(&mut ctx, None).unwrap();
        // Item, Wait
        machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();
        assert_eq!(machine.top(), Some(StateName::ItemUse));
        machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();

        assert_eq!(machine.top(), Some(StateName::FreeCursor));
        let hero = ctx.unit(&"hero".into()).unwrap();
        assert_eq!(hero.current_hp, 15);
        assert!(hero.items.is_empty());
        assert!(hero.flags.finished);
    }
}
