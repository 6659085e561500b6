//! Timed status effects (poison and friends)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    /// HP lost at the start of the owner's phase
    pub damage_per_turn: i32,
    /// Phases remaining; the effect is dropped when this reaches zero
    pub duration: u32,
}

impl StatusEffect {
    pub fn new(name: impl Into<String>, damage_per_turn: i32, duration: u32) -> Self {
        Self {
            name: name.into(),
            damage_per_turn,
            duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.duration == 0
    }
}

/// Outcome of ticking a unit's status list once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTick {
    pub damage: i32,
    pub expired: usize,
}

/// Apply one phase of every effect: sum the damage, count down and drop
/// expired effects.
pub fn tick_statuses(effects: &mut Vec<StatusEffect>) -> StatusTick {
    let mut tick = StatusTick::default();
    for effect in effects.iter_mut() {
        tick.damage += effect.damage_per_turn;
        effect.duration = effect.duration.saturating_sub(1);
    }
    let before = effects.len();
    effects.retain(|e| !e.is_expired());
    tick.expired = before - effects.len();
    tick
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_sums_damage_and_expires() {
        let mut effects = vec![
            StatusEffect::new("poison", 3, 2),
            StatusEffect::new("burn", 1, 1),
        ];

        let first = tick_statuses(&mut effects);
        assert_eq!(first.damage, 4);
        assert_eq!(first.expired, 1);
        assert_eq!(effects.len(), 1);

        let second = tick_statuses(&mut effects);
        assert_eq!(second.damage, 3);
        assert!(effects.is_empty());
    }
}
