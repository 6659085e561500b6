//! Phase order: which team acts, and the turn counter

use serde::{Deserialize, Serialize};

use crate::core::types::Team;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    teams: Vec<Team>,
    index: usize,
    /// 0 until the first player phase starts
    turn: u32,
}

impl Phase {
    /// `teams` in phase order; the first is the player
    pub fn new(teams: &[String]) -> Self {
        let mut teams: Vec<Team> = teams.iter().map(|t| Team::new(t.as_str())).collect();
        if teams.is_empty() {
            teams.push(Team::player());
        }
        Self {
            teams,
            index: 0,
            turn: 0,
        }
    }

    pub fn current(&self) -> &Team {
        &self.teams[self.index]
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn is_player_phase(&self) -> bool {
        self.index == 0
    }

    pub fn has_started(&self) -> bool {
        self.turn > 0
    }

    /// Move to the next team that still has units. The turn counter goes
    /// up whenever the order wraps back to the player.
    pub fn advance(&mut self, has_units: impl Fn(&Team) -> bool) {
        if self.turn == 0 {
            self.turn = 1;
            self.index = 0;
            return;
        }
        for _ in 0..self.teams.len() {
            self.index = (self.index + 1) % self.teams.len();
            if self.index == 0 {
                self.turn += 1;
                return;
            }
            if has_units(&self.teams[self.index]) {
                return;
            }
            tracing::debug!("Skipping {} phase: no units", self.teams[self.index]);
        }
    }
}
