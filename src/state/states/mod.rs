//! The gameplay states and the catalog that builds them

mod action_menu;
mod ai_phase;
mod chapter_end;
mod combat_playback;
mod event_playback;
mod free_cursor;
mod item_use;
mod move_select;
mod movement;
mod options_menu;
mod rescue;
mod targeting;
mod trade;
mod turn_change;

pub use action_menu::{ActionMenu, MenuOption};
pub use ai_phase::AiPhase;
pub use chapter_end::ChapterEnd;
pub use combat_playback::{CombatPhase, CombatPlayback};
pub use event_playback::EventPlayback;
pub use free_cursor::FreeCursor;
pub use item_use::ItemUse;
pub use move_select::MoveSelect;
pub use movement::MovementPlayback;
pub use options_menu::OptionsMenu;
pub use rescue::{Drop, Rescue};
pub use targeting::Targeting;
pub use trade::Trade;
pub use turn_change::{PhaseBanner, TurnChange};

use crate::core::types::{TilePos, UnitId};
use crate::map::GameBoard;
use crate::state::input::InputEvent;
use crate::state::machine::{GameState, StateCatalog};
use crate::state::{GameContext, StateName};
use crate::units::Unit;

fn build<S: GameState + Default + 'static>() -> Box<dyn GameState> {
    Box::<S>::default()
}

/// Catalog with every gameplay state registered
pub fn default_catalog() -> StateCatalog {
    let mut catalog = StateCatalog::new();
    catalog
        .register(StateName::FreeCursor, build::<FreeCursor>)
        .register(StateName::OptionsMenu, build::<OptionsMenu>)
        .register(StateName::MoveSelect, build::<MoveSelect>)
        .register(StateName::MovementPlayback, build::<MovementPlayback>)
        .register(StateName::ActionMenu, build::<ActionMenu>)
        .register(StateName::Targeting, build::<Targeting>)
        .register(StateName::CombatPlayback, build::<CombatPlayback>)
        .register(StateName::ItemUse, build::<ItemUse>)
        .register(StateName::Trade, build::<Trade>)
        .register(StateName::Rescue, build::<Rescue>)
        .register(StateName::Drop, build::<Drop>)
        .register(StateName::AiPhase, build::<AiPhase>)
        .register(StateName::TurnChange, build::<TurnChange>)
        .register(StateName::PhaseBanner, build::<PhaseBanner>)
        .register(StateName::EventPlayback, build::<EventPlayback>)
        .register(StateName::ChapterEnd, build::<ChapterEnd>);
    catalog
}

/// Move a menu index up or down with wrap-around. Returns true when the
/// input was a vertical step.
pub(crate) fn step_menu(index: &mut usize, len: usize, input: Option<InputEvent>) -> bool {
    if len == 0 {
        return false;
    }
    match input {
        Some(InputEvent::Up) | Some(InputEvent::Left) => {
            *index = (*index + len - 1) % len;
            true
        }
        Some(InputEvent::Down) | Some(InputEvent::Right) => {
            *index = (*index + 1) % len;
            true
        }
        _ => false,
    }
}

/// The selected unit, if it is alive and on the map
pub(crate) fn selected_on_board(ctx: &GameContext) -> Option<(UnitId, TilePos)> {
    let unit = ctx.selected()?;
    let pos = unit.position?;
    unit.is_alive().then(|| (unit.id.clone(), pos))
}

/// Living units on the four tiles around `pos`
pub(crate) fn adjacent_units(board: &GameBoard, pos: TilePos) -> impl Iterator<Item = &Unit> {
    pos.neighbors()
        .into_iter()
        .filter_map(move |p| board.unit_at(p))
        .filter(|u| u.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_wraps() {
        let mut index = 0;
        assert!(step_menu(&mut index, 3, Some(InputEvent::Up)));
        assert_eq!(index, 2);
        step_menu(&mut index, 3, Some(InputEvent::Down));
        assert_eq!(index, 0);
        assert!(!step_menu(&mut index, 3, Some(InputEvent::Select)));
        assert!(!step_menu(&mut index, 0, Some(InputEvent::Down)));
    }

    #[test]
    fn test_catalog_builds_every_state() {
        let catalog = default_catalog();
        for name in [
            StateName::FreeCursor,
            StateName::OptionsMenu,
            StateName::MoveSelect,
            StateName::MovementPlayback,
            StateName::ActionMenu,
            StateName::Targeting,
            StateName::CombatPlayback,
            StateName::ItemUse,
            StateName::Trade,
            StateName::Rescue,
            StateName::Drop,
            StateName::AiPhase,
            StateName::TurnChange,
            StateName::PhaseBanner,
            StateName::EventPlayback,
            StateName::ChapterEnd,
        ] {
            let state = catalog.create(name).unwrap();
            assert_eq!(state.name(), name);
        }
    }
}
