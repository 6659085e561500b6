//! Map backdrop: terrain, units and the cursor

use glam::Vec2;

use crate::core::types::TilePos;
use crate::render::colors::{self, team_color, terrain_color};
use crate::render::{sprite_or_placeholder, Rect, Surface};
use crate::state::GameContext;

/// Finished units are drawn greyed out
const FINISHED_SHADE: f32 = 0.5;

pub fn draw_map(surface: &mut dyn Surface, ctx: &GameContext) {
    let Some(board) = ctx.board.as_ref() else {
        return;
    };
    let camera = &ctx.camera;
    let ts = camera.tile_size as f32;
    let tile = Vec2::splat(ts);

    for y in camera.origin.y..camera.origin.y + camera.viewport.1 {
        for x in camera.origin.x..camera.origin.x + camera.viewport.0 {
            let pos = TilePos::new(x, y);
            let Some(terrain) = board.terrain(pos) else {
                continue;
            };
            let rect = Rect::at(camera.tile_to_screen(pos), tile);
            sprite_or_placeholder(
                surface,
                &ctx.sprites,
                &format!("terrain/{}", terrain),
                rect,
                terrain_color(terrain),
            );
        }
    }

    for region in board.regions() {
        if camera.is_visible(region.position) {
            let size = Vec2::new(region.size.0 as f32, region.size.1 as f32) * ts;
            surface.outline_rect(Rect::at(camera.tile_to_screen(region.position), size), colors::CURSOR.darken(0.7));
        }
    }

    for unit in board.units() {
        let Some(pos) = unit.position else {
            continue;
        };
        if !camera.is_visible(pos) {
            continue;
        }
        let mut origin = camera.tile_to_screen(pos) + ctx.combat_offsets.offset_of(&unit.id);
        if let Some((_, offset)) = ctx.moving.as_ref().filter(|(id, _)| id == &unit.id) {
            origin += *offset;
        }
        let mut color = team_color(&unit.team);
        if unit.flags.finished {
            color = color.darken(FINISHED_SHADE);
        }
        sprite_or_placeholder(
            surface,
            &ctx.sprites,
            &format!("map_sprites/{}", unit.class_id),
            Rect::at(origin, tile).inset(2.0),
            color,
        );
    }

    surface.outline_rect(Rect::at(camera.tile_to_screen(ctx.cursor), tile), colors::CURSOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::types::Team;
    use crate::data::{Constants, Database};
    use crate::map::GameBoard;
    use crate::render::{DrawCommand, RecordingSurface};
    use crate::units::{Stats, Unit};

    #[test]
    fn test_unit_drawn_with_offset() {
        let mut ctx = GameContext::new(Database::new(Constants::default()), EngineConfig::default(), 0);
        let mut board = GameBoard::new(2, 1, "plains");
        board.insert_unit(Unit::new("hero", Team::player(), "lord", Stats { hp: 10, ..Stats::default() }));
        board.set_unit(&"hero".into(), TilePos::new(1, 0)).unwrap();
        ctx.board = Some(board);
        ctx.combat_offsets.set(&"hero".into(), Vec2::new(3.0, 0.0));

        let mut surface = RecordingSurface::new();
        draw_map(&mut surface, &ctx);

        // Two tiles, one unit, the cursor
        assert_eq!(surface.len(), 4);
        let unit_rect = Rect::at(Vec2::new(16.0 + 3.0, 0.0), Vec2::splat(16.0)).inset(2.0);
        assert!(surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::FillRect(r, _) if *r == unit_rect)));
    }
}
