//! 2D drawing interface for the turn-simulation core
//!
//! The core only describes what to draw through the `Surface` trait.
//! Pixels, scaling and fonts belong to the host. `RecordingSurface`
//! keeps the command list for headless runs and tests.

pub mod camera;
pub mod colors;
pub mod map_view;
pub mod sprites;

pub use camera::Camera;
pub use colors::Color;
pub use map_view::draw_map;
pub use sprites::{SpriteBank, SpriteHandle, SpriteRegion};

use glam::Vec2;
use serde::Serialize;

/// Axis-aligned rectangle in game pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn at(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Shrink by `amount` on every side
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.w - 2.0 * amount).max(0.0),
            (self.h - 2.0 * amount).max(0.0),
        )
    }
}

/// Drawing operations the core needs from the host
pub trait Surface {
    fn fill(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn outline_rect(&mut self, rect: Rect, color: Color);
    fn line(&mut self, from: Vec2, to: Vec2, color: Color);
    fn text(&mut self, text: &str, pos: Vec2, color: Color, size: u32);
    fn blit(&mut self, sprite: SpriteHandle, pos: Vec2);
    fn blit_region(&mut self, sprite: SpriteHandle, region: SpriteRegion, pos: Vec2);
    fn blit_image(&mut self, sprite: SpriteHandle, pos: Vec2, alpha: f32, flip: bool);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    Fill(Color),
    FillRect(Rect, Color),
    OutlineRect(Rect, Color),
    Line(Vec2, Vec2, Color),
    Text { text: String, pos: Vec2, color: Color, size: u32 },
    Blit(SpriteHandle, Vec2),
    BlitRegion(SpriteHandle, SpriteRegion, Vec2),
    BlitImage { sprite: SpriteHandle, pos: Vec2, alpha: f32, flip: bool },
}

/// Surface that stores commands instead of drawing
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every string drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Surface for RecordingSurface {
    fn fill(&mut self, color: Color) {
        self.commands.push(DrawCommand::Fill(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn outline_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::OutlineRect(rect, color));
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.commands.push(DrawCommand::Line(from, to, color));
    }

    fn text(&mut self, text: &str, pos: Vec2, color: Color, size: u32) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            color,
            size,
        });
    }

    fn blit(&mut self, sprite: SpriteHandle, pos: Vec2) {
        self.commands.push(DrawCommand::Blit(sprite, pos));
    }

    fn blit_region(&mut self, sprite: SpriteHandle, region: SpriteRegion, pos: Vec2) {
        self.commands.push(DrawCommand::BlitRegion(sprite, region, pos));
    }

    fn blit_image(&mut self, sprite: SpriteHandle, pos: Vec2, alpha: f32, flip: bool) {
        self.commands.push(DrawCommand::BlitImage {
            sprite,
            pos,
            alpha,
            flip,
        });
    }
}

/// Draw `sprite` when it is loaded, a placeholder rectangle otherwise
pub fn sprite_or_placeholder(
    surface: &mut dyn Surface,
    bank: &SpriteBank,
    sprite: &str,
    rect: Rect,
    fallback: Color,
) {
    match bank.get(sprite) {
        Some(handle) => surface.blit(handle, rect.origin()),
        None => surface.fill_rect(rect, fallback),
    }
}

/// Boxed menu with one highlighted row
pub fn draw_menu(surface: &mut dyn Surface, pos: Vec2, options: &[&str], selected: usize) {
    const ROW: f32 = 14.0;
    const WIDTH: f32 = 72.0;

    let frame = Rect::new(pos.x, pos.y, WIDTH, ROW * options.len() as f32 + 4.0);
    surface.fill_rect(frame, colors::MENU_BG);
    surface.outline_rect(frame, colors::WHITE);
    for (i, option) in options.iter().enumerate() {
        let row_pos = Vec2::new(pos.x + 2.0, pos.y + 2.0 + ROW * i as f32);
        if i == selected {
            surface.fill_rect(Rect::at(row_pos, Vec2::new(WIDTH - 4.0, ROW)), colors::MENU_HIGHLIGHT);
        }
        surface.text(option, row_pos + Vec2::new(4.0, 2.0), colors::WHITE, 8);
    }
}
