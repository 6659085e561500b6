//! Map camera
//!
//! Tracks which tiles are in view and converts between tiles and
//! game-space pixels.

use glam::Vec2;

use crate::core::types::TilePos;

/// Tiles kept between the cursor and the viewport edge while scrolling
const SCROLL_MARGIN: i32 = 2;

#[derive(Debug, Clone)]
pub struct Camera {
    /// Top-left tile of the viewport
    pub origin: TilePos,
    /// Viewport size in tiles
    pub viewport: (i32, i32),
    /// Edge length of one tile in game pixels
    pub tile_size: i32,
    /// Map size in tiles, for clamping
    pub map_size: (i32, i32),
}

impl Camera {
    pub fn new(viewport: (i32, i32), tile_size: i32) -> Self {
        Self {
            origin: TilePos::new(0, 0),
            viewport,
            tile_size,
            map_size: viewport,
        }
    }

    pub fn set_map_size(&mut self, width: i32, height: i32) {
        self.map_size = (width, height);
        self.clamp_to_bounds();
    }

    /// Top-left pixel of a tile on screen
    pub fn tile_to_screen(&self, pos: TilePos) -> Vec2 {
        let ts = self.tile_size as f32;
        Vec2::new(
            (pos.x - self.origin.x) as f32 * ts,
            (pos.y - self.origin.y) as f32 * ts,
        )
    }

    /// Tile under a screen pixel (may be out of bounds)
    pub fn screen_to_tile(&self, pixel: Vec2) -> TilePos {
        let ts = self.tile_size.max(1) as f32;
        TilePos::new(
            (pixel.x / ts).floor() as i32 + self.origin.x,
            (pixel.y / ts).floor() as i32 + self.origin.y,
        )
    }

    pub fn is_visible(&self, pos: TilePos) -> bool {
        pos.x >= self.origin.x
            && pos.y >= self.origin.y
            && pos.x < self.origin.x + self.viewport.0
            && pos.y < self.origin.y + self.viewport.1
    }

    /// Scroll so `pos` sits at least the scroll margin inside the view
    pub fn follow(&mut self, pos: TilePos) {
        let margin_x = SCROLL_MARGIN.min((self.viewport.0 - 1) / 2);
        let margin_y = SCROLL_MARGIN.min((self.viewport.1 - 1) / 2);

        if pos.x < self.origin.x + margin_x {
            self.origin.x = pos.x - margin_x;
        } else if pos.x >= self.origin.x + self.viewport.0 - margin_x {
            self.origin.x = pos.x - self.viewport.0 + margin_x + 1;
        }
        if pos.y < self.origin.y + margin_y {
            self.origin.y = pos.y - margin_y;
        } else if pos.y >= self.origin.y + self.viewport.1 - margin_y {
            self.origin.y = pos.y - self.viewport.1 + margin_y + 1;
        }
        self.clamp_to_bounds();
    }

    /// Center the view on a tile
    pub fn center_on(&mut self, pos: TilePos) {
        self.origin = TilePos::new(pos.x - self.viewport.0 / 2, pos.y - self.viewport.1 / 2);
        self.clamp_to_bounds();
    }

    fn clamp_to_bounds(&mut self) {
        let max_x = (self.map_size.0 - self.viewport.0).max(0);
        let max_y = (self.map_size.1 - self.viewport.1).max(0);
        self.origin.x = self.origin.x.clamp(0, max_x);
        self.origin.y = self.origin.y.clamp(0, max_y);
    }
}
