//! Engine configuration with documented constants
//!
//! Timings are in milliseconds of game time. The driver advances the
//! frame clock by `frame_ms` every frame, so playback lengths are
//! independent of the host's real frame rate.

use serde::{Deserialize, Serialize};

use crate::core::types::Millis;

/// Runtime configuration for the turn-simulation kernel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === DRIVER ===
    /// Game time that passes per frame
    pub frame_ms: Millis,

    /// Maximum state steps per frame before the driver gives up
    ///
    /// Breaks pathological loops where states keep re-entering each other.
    pub max_state_iterations: usize,

    // === VIEW ===
    /// Edge length of one tile in logical game pixels
    pub tile_size: i32,

    /// Viewport size in tiles
    pub viewport_tiles: (i32, i32),

    // === PLAYBACK ===
    /// Time the moving unit spends on each tile of its path
    pub move_ms_per_tile: Millis,

    /// Pause between AI units
    pub ai_unit_delay_ms: Millis,

    /// How long the phase banner stays on screen
    pub phase_banner_ms: Millis,

    /// Dying units fade to white over this long
    pub death_fade_ms: Millis,

    /// EXP bar fill duration
    pub exp_bar_ms: Millis,

    /// Level-up screen hold duration
    pub level_up_ms: Millis,

    /// Length of a `transition` event command
    pub transition_ms: Millis,

    /// Length of one strike in map (non-animated) combat
    pub map_strike_ms: Millis,

    /// How long the victory / defeat banner holds
    pub chapter_end_ms: Millis,

    /// Dialog typewriter speed
    pub chars_per_frame: usize,

    // === BEHAVIOR ===
    /// End the player phase automatically when every unit is spent
    pub autoend_turn: bool,

    /// Prefer animated combat when both sides have a valid animation
    pub animated_combat: bool,

    /// The player team is played by the AI as well (headless runs)
    pub autoplay: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_ms: 16,
            max_state_iterations: 10,

            tile_size: 16,
            viewport_tiles: (15, 10),

            move_ms_per_tile: 64,
            ai_unit_delay_ms: 250,
            phase_banner_ms: 1000,
            death_fade_ms: 500,
            exp_bar_ms: 500,
            level_up_ms: 1500,
            transition_ms: 500,
            map_strike_ms: 400,
            chapter_end_ms: 2000,
            chars_per_frame: 2,

            autoend_turn: true,
            animated_combat: true,
            autoplay: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_ms == 0 {
            return Err("frame_ms must be positive".into());
        }

        if self.max_state_iterations == 0 {
            return Err("max_state_iterations must be at least 1".into());
        }

        if self.tile_size <= 0 {
            return Err(format!("tile_size ({}) must be positive", self.tile_size));
        }

        if self.viewport_tiles.0 <= 0 || self.viewport_tiles.1 <= 0 {
            return Err(format!(
                "viewport_tiles {:?} must be positive",
                self.viewport_tiles
            ));
        }

        if self.chars_per_frame == 0 {
            return Err("chars_per_frame must be at least 1".into());
        }

        Ok(())
    }

    /// Number of frames needed to cover `ms` of game time (at least 1)
    pub fn frames_for(&self, ms: Millis) -> u32 {
        ms.div_ceil(self.frame_ms).max(1)
    }
}
