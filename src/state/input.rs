//! Decoded logical input

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::types::{Direction, TilePos};
use crate::render::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    Up,
    Down,
    Left,
    Right,
    Select,
    Back,
    Info,
    Aux,
    Start,
}

impl InputEvent {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            InputEvent::Up => Some(Direction::Up),
            InputEvent::Down => Some(Direction::Down),
            InputEvent::Left => Some(Direction::Left),
            InputEvent::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickKind {
    Select,
    Back,
    Info,
}

impl From<ClickKind> for InputEvent {
    fn from(click: ClickKind) -> Self {
        match click {
            ClickKind::Select => InputEvent::Select,
            ClickKind::Back => InputEvent::Back,
            ClickKind::Info => InputEvent::Info,
        }
    }
}

/// Mouse state for the current frame, fed by the host
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    /// Most recent click this frame
    pub click: Option<ClickKind>,
    /// The pointer moved this frame
    pub moved: bool,
    /// Hovered position in game pixels
    pub pixel: Option<Vec2>,
}

impl MouseState {
    pub fn hovered_tile(&self, camera: &Camera) -> Option<TilePos> {
        self.pixel.map(|p| camera.screen_to_tile(p))
    }

    /// Forget per-frame events, keep the hover position
    pub fn end_frame(&mut self) {
        self.click = None;
        self.moved = false;
    }
}

/// Merge keyboard and mouse into the frame's single input. Keys win.
pub fn decode(key: Option<InputEvent>, mouse: &MouseState) -> Option<InputEvent> {
    key.or(mouse.click.map(InputEvent::from))
}
