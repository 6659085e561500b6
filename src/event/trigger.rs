//! Event definitions, triggers and the queue of events waiting to play

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{Team, UnitId};
use crate::event::command::EventCommand;

/// When an event fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventTrigger {
    LevelStart,
    /// Start of `team`'s phase, on every turn or only on `turn`
    Turn {
        team: Team,
        #[serde(default)]
        turn: Option<u32>,
    },
    /// A visit or shop region was used
    Region { region: String },
    Talk { unit_a: UnitId, unit_b: UnitId },
    Support { unit_a: UnitId, unit_b: UnitId, rank: String },
}

/// Something that just happened in the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSignal {
    LevelStart,
    PhaseStart { team: Team, turn: u32 },
    Region(String),
    Talk(UnitId, UnitId),
    Support(UnitId, UnitId, String),
}

fn same_pair(a: &UnitId, b: &UnitId, x: &UnitId, y: &UnitId) -> bool {
    (a == x && b == y) || (a == y && b == x)
}

impl EventTrigger {
    pub fn matches(&self, signal: &GameSignal) -> bool {
        match (self, signal) {
            (EventTrigger::LevelStart, GameSignal::LevelStart) => true,
            (EventTrigger::Turn { team, turn }, GameSignal::PhaseStart { team: t, turn: n }) => {
                team == t && turn.map_or(true, |want| want == *n)
            }
            (EventTrigger::Region { region }, GameSignal::Region(r)) => region == r,
            (EventTrigger::Talk { unit_a, unit_b }, GameSignal::Talk(x, y)) => same_pair(unit_a, unit_b, x, y),
            (EventTrigger::Support { unit_a, unit_b, rank }, GameSignal::Support(x, y, r)) => {
                rank == r && same_pair(unit_a, unit_b, x, y)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub trigger: EventTrigger,
    /// Fire at most once per chapter
    #[serde(default)]
    pub once: bool,
    #[serde(default)]
    pub commands: Vec<EventCommand>,
}

/// Chapter events and the queue of ones waiting to play
#[derive(Debug, Clone, Default)]
pub struct EventManager {
    defs: Vec<EventDef>,
    fired: AHashSet<String>,
    queue: VecDeque<EventDef>,
}

impl EventManager {
    pub fn new(defs: Vec<EventDef>) -> Self {
        Self {
            defs,
            ..Self::default()
        }
    }

    /// Queue every event that reacts to `signal`. Returns how many queued.
    pub fn signal(&mut self, signal: &GameSignal) -> usize {
        let mut queued = 0;
        for def in &self.defs {
            if !def.trigger.matches(signal) || (def.once && self.fired.contains(&def.id)) {
                continue;
            }
            self.fired.insert(def.id.clone());
            self.queue.push_back(def.clone());
            queued += 1;
            tracing::debug!("Queued event '{}'", def.id);
        }
        queued
    }

    /// Whether any event reacts to `signal`, without queuing
    pub fn would_fire(&self, signal: &GameSignal) -> bool {
        self.defs
            .iter()
            .any(|def| def.trigger.matches(signal) && !(def.once && self.fired.contains(&def.id)))
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn next_pending(&mut self) -> Option<EventDef> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, trigger: EventTrigger, once: bool) -> EventDef {
        EventDef {
            id: id.into(),
            trigger,
            once,
            commands: vec![EventCommand::parse("wait;100")],
        }
    }

    #[test]
    fn test_turn_trigger_matches_team_and_turn() {
        let trigger = EventTrigger::Turn {
            team: Team::enemy(),
            turn: Some(2),
        };
        assert!(trigger.matches(&GameSignal::PhaseStart { team: Team::enemy(), turn: 2 }));
        assert!(!trigger.matches(&GameSignal::PhaseStart { team: Team::enemy(), turn: 3 }));
        assert!(!trigger.matches(&GameSignal::PhaseStart { team: Team::player(), turn: 2 }));
    }

    #[test]
    fn test_talk_is_unordered() {
        let trigger = EventTrigger::Talk {
            unit_a: "eirika".into(),
            unit_b: "seth".into(),
        };
        assert!(trigger.matches(&GameSignal::Talk("seth".into(), "eirika".into())));
    }

    #[test]
    fn test_once_events_fire_once() {
        let mut manager = EventManager::new(vec![
            def("intro", EventTrigger::LevelStart, true),
            def(
                "every_turn",
                EventTrigger::Turn {
                    team: Team::player(),
                    turn: None,
                },
                false,
            ),
        ]);

        assert_eq!(manager.signal(&GameSignal::LevelStart), 1);
        assert_eq!(manager.signal(&GameSignal::LevelStart), 0);

        let phase = GameSignal::PhaseStart {
            team: Team::player(),
            turn: 1,
        };
        manager.signal(&phase);
        manager.signal(&phase);
        assert_eq!(manager.pending(), 3);
        assert_eq!(manager.next_pending().map(|e| e.id), Some("intro".to_string()));
    }

    #[test]
    fn test_toml_event_def() {
        let text = r#"
            id = "gate"
            once = true
            trigger = { type = "region", region = "village_1" }
            commands = ["speak;Elder;Take this.", "give_item;eirika;vulnerary"]
        "#;
        let def: EventDef = toml::from_str(text).unwrap();
        assert_eq!(def.commands.len(), 2);
        assert_eq!(def.commands[1].arg(1), Some("vulnerary"));
        assert!(def.trigger.matches(&GameSignal::Region("village_1".into())));
    }
}
