//! Sprite nudges the map renderer applies while a combat plays

use glam::Vec2;

use crate::core::types::UnitId;

/// Shared between the combat playback (writer) and the map renderer
/// (reader). Empty whenever no combat is running.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatOffsets {
    nudges: Vec<(UnitId, Vec2)>,
    pub shake: Vec2,
}

impl CombatOffsets {
    pub fn set(&mut self, unit: &UnitId, offset: Vec2) {
        match self.nudges.iter_mut().find(|(id, _)| id == unit) {
            Some((_, current)) => *current = offset,
            None => self.nudges.push((unit.clone(), offset)),
        }
    }

    /// Pixel offset for a unit's map sprite
    pub fn offset_of(&self, unit: &UnitId) -> Vec2 {
        self.nudges
            .iter()
            .find(|(id, _)| id == unit)
            .map(|(_, offset)| *offset + self.shake)
            .unwrap_or(Vec2::ZERO)
    }

    pub fn clear(&mut self) {
        self.nudges.clear();
        self.shake = Vec2::ZERO;
    }

    pub fn is_clear(&self) -> bool {
        self.nudges.is_empty() && self.shake == Vec2::ZERO
    }
}
