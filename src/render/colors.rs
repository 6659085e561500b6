//! Color definitions for teams, overlays and UI chrome

use serde::{Deserialize, Serialize};

use crate::core::types::Team;

/// RGBA color (0.0 to 1.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Darken color by a factor (0.0 = black, 1.0 = unchanged)
    pub fn darken(&self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    /// Blend toward white (0.0 = unchanged, 1.0 = white)
    pub fn whiten(&self, amount: f32) -> Self {
        let t = amount.clamp(0.0, 1.0);
        Self {
            r: self.r + (1.0 - self.r) * t,
            g: self.g + (1.0 - self.g) * t,
            b: self.b + (1.0 - self.b) * t,
            a: self.a,
        }
    }

    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a, ..*self }
    }
}

pub const BACKGROUND: Color = Color::new(0.1, 0.1, 0.12, 1.0);
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
pub const CURSOR: Color = Color::new(1.0, 0.85, 0.2, 1.0);
pub const MENU_BG: Color = Color::new(0.08, 0.12, 0.3, 0.9);
pub const MENU_HIGHLIGHT: Color = Color::new(0.3, 0.45, 0.9, 1.0);

// Overlays
pub const MOVE_HIGHLIGHT: Color = Color::new(0.2, 0.4, 1.0, 0.45);
pub const ATTACK_HIGHLIGHT: Color = Color::new(1.0, 0.2, 0.2, 0.45);
pub const PATH_MARKER: Color = Color::new(1.0, 1.0, 1.0, 0.6);

/// Fallback tile color when no terrain sprite is loaded
pub fn terrain_color(terrain: &str) -> Color {
    match terrain {
        "plains" => Color::new(0.45, 0.7, 0.3, 1.0),
        "forest" => Color::new(0.15, 0.45, 0.15, 1.0),
        "mountain" | "peak" => Color::new(0.5, 0.4, 0.3, 1.0),
        "water" | "sea" | "river" => Color::new(0.2, 0.4, 0.8, 1.0),
        "wall" => Color::new(0.35, 0.35, 0.35, 1.0),
        "village" | "house" | "shop" => Color::new(0.75, 0.55, 0.35, 1.0),
        "throne" | "gate" => Color::new(0.8, 0.7, 0.2, 1.0),
        _ => Color::new(0.3, 0.3, 0.3, 1.0),
    }
}

/// Base color for a team's units
pub fn team_color(team: &Team) -> Color {
    match team.as_str() {
        Team::PLAYER => Color::new(0.2, 0.4, 0.9, 1.0),
        Team::ENEMY => Color::new(0.85, 0.2, 0.2, 1.0),
        "other" => Color::new(0.2, 0.75, 0.3, 1.0),
        _ => Color::new(0.6, 0.6, 0.6, 1.0),
    }
}

/// HP bar color: green when healthy through red when low
pub fn health_color(hp: i32, max_hp: i32) -> Color {
    let ratio = if max_hp > 0 {
        (hp as f32 / max_hp as f32).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Color::new(1.0 - ratio, 0.3 + 0.6 * ratio, 0.2, 1.0)
}
