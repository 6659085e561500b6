//! The game context every state reads and writes
//!
//! States never hold references into the context between calls. They
//! talk to each other through the intent slots below (selected unit,
//! combat target, move origin, pending movement, Canto budget) and
//! queue stack transitions that the driver applies after each call.

use ahash::AHashMap;
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::combat::CombatOffsets;
use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::{Direction, Team, TilePos, UnitId};
use crate::data::{ChapterRules, Database, LevelPrefab};
use crate::event::{EventManager, GameSignal};
use crate::map::GameBoard;
use crate::render::{Camera, SpriteBank};
use crate::state::input::MouseState;
use crate::state::machine::Transition;
use crate::state::phase::Phase;
use crate::state::StateName;
use crate::support::SupportBook;
use crate::units::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChapterOutcome {
    Victory,
    Defeat,
}

/// Walk request for `MovementPlayback`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub unit: UnitId,
    pub path: Vec<TilePos>,
}

/// What the save subsystem persists
#[derive(Debug, Clone, Serialize)]
pub struct SaveSnapshot {
    pub units: Vec<Unit>,
    pub support: SupportBook,
    pub phase: Phase,
    pub vars: BTreeMap<String, String>,
}

pub struct GameContext {
    pub db: Database,
    pub config: EngineConfig,
    pub board: Option<GameBoard>,
    pub rules: ChapterRules,
    pub phase: Phase,
    pub support: SupportBook,
    pub events: EventManager,
    /// Game variables set by events
    pub vars: AHashMap<String, String>,
    pub rng: ChaCha8Rng,

    // === VIEW ===
    pub cursor: TilePos,
    pub camera: Camera,
    pub mouse: MouseState,
    pub sprites: SpriteBank,
    pub combat_offsets: CombatOffsets,
    /// Unit being walked and its pixel offset from its board tile
    pub moving: Option<(UnitId, Vec2)>,

    // === INTENT ===
    pub selected_unit: Option<UnitId>,
    pub combat_target: Option<UnitId>,
    /// Where the selected unit stood before moving, for undo
    pub move_origin: Option<TilePos>,
    /// MOV the selected unit spent this turn
    pub move_spent: u32,
    pub pending_move: Option<PendingMove>,
    /// Remaining MOV while a Canto move is being chosen
    pub canto: Option<u32>,
    pub outcome: Option<ChapterOutcome>,

    // === CLOCK ===
    /// Game time in milliseconds
    pub clock: u64,
    pub frame: u64,

    transitions: Vec<Transition>,
}

impl GameContext {
    pub fn new(db: Database, config: EngineConfig, seed: u64) -> Self {
        let camera = Camera::new(config.viewport_tiles, config.tile_size);
        let phase = Phase::new(&db.constants.teams);
        let support = SupportBook::from_database(&db);
        Self {
            db,
            config,
            board: None,
            rules: ChapterRules::default(),
            phase,
            support,
            events: EventManager::default(),
            vars: AHashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            cursor: TilePos::new(0, 0),
            camera,
            mouse: MouseState::default(),
            sprites: SpriteBank::new(),
            combat_offsets: CombatOffsets::default(),
            moving: None,
            selected_unit: None,
            combat_target: None,
            move_origin: None,
            move_spent: 0,
            pending_move: None,
            canto: None,
            outcome: None,
            clock: 0,
            frame: 0,
            transitions: Vec::new(),
        }
    }

    /// Build a chapter and make it current. Support progress carries over.
    pub fn load_level(&mut self, level: &LevelPrefab) -> Result<()> {
        let built = level.build(&self.db)?;
        self.camera.set_map_size(built.board.width(), built.board.height());

        let player = Team::new(self.player_team().as_str());
        self.cursor = built
            .board
            .team_units(&player)
            .find_map(|u| u.position)
            .unwrap_or_default();
        self.camera.center_on(self.cursor);

        self.board = Some(built.board);
        self.rules = built.rules;
        self.events = EventManager::new(built.events);
        self.phase = Phase::new(&self.db.constants.teams);
        self.clear_intent();
        self.outcome = None;
        self.combat_offsets.clear();
        self.moving = None;

        let queued = self.events.signal(&GameSignal::LevelStart);
        tracing::info!("Chapter '{}' loaded ({} opening events)", level.id, queued);
        Ok(())
    }

    // === TRANSITIONS ===

    pub fn push(&mut self, name: StateName) {
        self.transitions.push(Transition::Push(name));
    }

    pub fn change(&mut self, name: StateName) {
        self.transitions.push(Transition::Change(name));
    }

    pub fn back(&mut self) {
        self.transitions.push(Transition::Back);
    }

    pub fn clear(&mut self) {
        self.transitions.push(Transition::Clear);
    }

    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub(crate) fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    // === QUERIES ===

    pub fn player_team(&self) -> &Team {
        &self.phase.teams()[0]
    }

    pub fn acting_team(&self) -> Team {
        self.phase.current().clone()
    }

    /// Units of this team are driven by AiPhase rather than input
    pub fn is_ai_controlled(&self, team: &Team) -> bool {
        self.config.autoplay || team != self.player_team()
    }

    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.board.as_ref()?.unit(id)
    }

    pub fn selected(&self) -> Option<&Unit> {
        self.unit(self.selected_unit.as_ref()?)
    }

    /// Unit ids saved for the save subsystem, plus book, phase and vars
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            units: self
                .board
                .as_ref()
                .map(|b| b.all_units().cloned().collect())
                .unwrap_or_default(),
            support: self.support.clone(),
            phase: self.phase.clone(),
            vars: self.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    // === UNIT BOOKKEEPING ===

    /// The unit is done for this phase
    pub fn finish_unit(&mut self, id: &UnitId) {
        if let Some(unit) = self.board.as_mut().and_then(|b| b.unit_mut(id)) {
            unit.flags.finished = true;
            tracing::debug!("{} finished", id);
        }
    }

    /// Forget the selection and everything tied to it
    pub fn clear_intent(&mut self) {
        self.selected_unit = None;
        self.combat_target = None;
        self.move_origin = None;
        self.move_spent = 0;
        self.pending_move = None;
        self.canto = None;
    }

    // === CURSOR ===

    pub fn set_cursor(&mut self, pos: TilePos) {
        let Some(board) = self.board.as_ref() else {
            return;
        };
        if board.in_bounds(pos) {
            self.cursor = pos;
            self.camera.follow(pos);
        }
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        self.set_cursor(self.cursor.offset(direction));
    }

    /// Follow the mouse when it moved over the map this frame
    pub fn follow_mouse(&mut self) {
        if !self.mouse.moved {
            return;
        }
        if let Some(tile) = self.mouse.hovered_tile(&self.camera) {
            self.set_cursor(tile);
        }
    }

    // === CHAPTER FLOW ===

    /// Decide the chapter if a side has lost. Sets `outcome` once.
    pub fn check_outcome(&mut self) -> Option<ChapterOutcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        let board = self.board.as_ref()?;
        let player = self.player_team().clone();

        let lord_dead = self
            .rules
            .lord
            .as_ref()
            .and_then(|id| board.unit(id))
            .is_some_and(|lord| !lord.is_alive());
        let players_left = board.living_team_units(&player).count();
        let enemies_left = board
            .all_units()
            .filter(|u| u.is_alive() && (u.is_on_board() || u.carrier().is_some()))
            .filter(|u| !self.db.are_allied(&player, &u.team))
            .count();

        let outcome = if lord_dead || players_left == 0 {
            Some(ChapterOutcome::Defeat)
        } else if enemies_left == 0 {
            Some(ChapterOutcome::Victory)
        } else {
            None
        };
        if let Some(result) = outcome {
            tracing::info!("Chapter decided: {:?}", result);
            self.outcome = Some(result);
        }
        outcome
    }

    /// Replace the stack with the chapter end banner once decided
    pub fn end_chapter_if_decided(&mut self) -> bool {
        if self.check_outcome().is_none() {
            return false;
        }
        self.clear();
        self.push(StateName::ChapterEnd);
        true
    }

    /// Push event playback when events are waiting
    pub fn play_pending_events(&mut self) -> bool {
        if !self.events.has_pending() {
            return false;
        }
        self.push(StateName::EventPlayback);
        true
    }
}
