//! Push-down state machine driving every interactive phase
//!
//! Only the top state receives input. States queue `Transition`s on the
//! context; the driver applies them after each call and keeps stepping
//! the new top until a frame settles or the iteration cap is reached.

use ahash::AHashMap;

use crate::core::error::{EmblemError, Result};
use crate::render::{colors, draw_map, Surface};
use crate::state::context::GameContext;
use crate::state::input::{decode, InputEvent};
use crate::state::StateName;

/// What a state call asks of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateResult {
    /// Nothing more this frame
    Idle,
    /// Step me again this frame (with no input)
    Repeat,
}

/// Outcome of one driver step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateStep {
    Idle,
    Repeat,
    /// Transitions were applied; the top may have changed
    Terminal,
}

/// Stack operation queued by a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Push(StateName),
    /// End and pop the top, then push
    Change(StateName),
    /// End and pop the top
    Back,
    /// End and drop every state
    Clear,
}

pub trait GameState {
    fn name(&self) -> StateName;

    /// Draw the tile map beneath this state
    fn show_map(&self) -> bool {
        true
    }

    /// States below stay visible
    fn transparent(&self) -> bool {
        false
    }

    /// Requires a loaded board
    fn in_level(&self) -> bool {
        true
    }

    /// Called every time the state becomes top
    fn begin(&mut self, _ctx: &mut GameContext) -> Result<StateResult> {
        Ok(StateResult::Idle)
    }

    /// Called when the state is popped, replaced or cleared
    fn end(&mut self, _ctx: &mut GameContext) {}

    fn take_input(&mut self, _input: Option<InputEvent>, _ctx: &mut GameContext) -> Result<StateResult> {
        Ok(StateResult::Idle)
    }

    fn update(&mut self, _ctx: &mut GameContext) -> Result<StateResult> {
        Ok(StateResult::Idle)
    }

    fn draw(&self, _surface: &mut dyn Surface, _ctx: &GameContext) {}
}

pub type StateConstructor = fn() -> Box<dyn GameState>;

/// Maps state names to constructors
#[derive(Default, Clone)]
pub struct StateCatalog {
    constructors: AHashMap<StateName, StateConstructor>,
}

impl StateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: StateName, constructor: StateConstructor) -> &mut Self {
        self.constructors.insert(name, constructor);
        self
    }

    pub fn contains(&self, name: StateName) -> bool {
        self.constructors.contains_key(&name)
    }

    pub fn create(&self, name: StateName) -> Result<Box<dyn GameState>> {
        self.constructors
            .get(&name)
            .map(|build| build())
            .ok_or(EmblemError::UnknownState(name))
    }
}

struct StackEntry {
    state: Box<dyn GameState>,
    /// Became top since its last `begin`
    needs_begin: bool,
}

pub struct StateMachine {
    catalog: StateCatalog,
    stack: Vec<StackEntry>,
}

impl StateMachine {
    pub fn new(catalog: StateCatalog) -> Self {
        Self {
            catalog,
            stack: Vec::new(),
        }
    }

    pub fn top(&self) -> Option<StateName> {
        self.stack.last().map(|e| e.state.name())
    }

    /// State names bottom to top
    pub fn names(&self) -> Vec<StateName> {
        self.stack.iter().map(|e| e.state.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Run one frame: advance the clock, decode input, step the top state
    /// until it settles. Programmer faults come back as errors.
    pub fn run_frame(&mut self, ctx: &mut GameContext, key: Option<InputEvent>) -> Result<()> {
        ctx.frame += 1;
        ctx.clock += u64::from(ctx.config.frame_ms);

        let mut input = decode(key, &ctx.mouse);
        let result = self.step_until_idle(ctx, &mut input);
        ctx.mouse.end_frame();
        result
    }

    fn step_until_idle(&mut self, ctx: &mut GameContext, input: &mut Option<InputEvent>) -> Result<()> {
        self.apply_transitions(ctx)?;

        let cap = ctx.config.max_state_iterations;
        for _ in 0..cap {
            match self.step(ctx, input)? {
                StateStep::Idle => return Ok(()),
                StateStep::Repeat | StateStep::Terminal => {}
            }
        }
        tracing::warn!(
            "State loop hit {} iterations in frame {} (top: {:?})",
            cap,
            ctx.frame,
            self.top()
        );
        Ok(())
    }

    /// One begin / input / update pass over the top state
    fn step(&mut self, ctx: &mut GameContext, input: &mut Option<InputEvent>) -> Result<StateStep> {
        let Some(entry) = self.stack.last_mut() else {
            return Ok(StateStep::Idle);
        };

        if entry.needs_begin {
            entry.needs_begin = false;
            let began = entry.state.begin(ctx)?;
            if self.apply_transitions(ctx)? {
                return Ok(StateStep::Terminal);
            }
            if began == StateResult::Repeat {
                return Ok(StateStep::Repeat);
            }
        }

        let Some(entry) = self.stack.last_mut() else {
            return Ok(StateStep::Idle);
        };
        let took = entry.state.take_input(input.take(), ctx)?;
        if self.apply_transitions(ctx)? {
            return Ok(StateStep::Terminal);
        }

        let Some(entry) = self.stack.last_mut() else {
            return Ok(StateStep::Idle);
        };
        let updated = entry.state.update(ctx)?;
        if self.apply_transitions(ctx)? {
            return Ok(StateStep::Terminal);
        }

        if took == StateResult::Repeat || updated == StateResult::Repeat {
            Ok(StateStep::Repeat)
        } else {
            Ok(StateStep::Idle)
        }
    }

    /// Apply queued transitions. Returns whether there were any.
    fn apply_transitions(&mut self, ctx: &mut GameContext) -> Result<bool> {
        let transitions = ctx.take_transitions();
        if transitions.is_empty() {
            return Ok(false);
        }
        for transition in transitions {
            tracing::debug!("State transition {:?} (stack {:?})", transition, self.names());
            match transition {
                Transition::Push(name) => self.push(ctx, name)?,
                Transition::Change(name) => {
                    self.pop(ctx);
                    self.push(ctx, name)?;
                }
                Transition::Back => self.pop(ctx),
                Transition::Clear => {
                    while !self.stack.is_empty() {
                        self.pop(ctx);
                    }
                }
            }
        }
        if let Some(top) = self.stack.last_mut() {
            top.needs_begin = true;
        }
        Ok(true)
    }

    fn push(&mut self, ctx: &GameContext, name: StateName) -> Result<()> {
        let state = self.catalog.create(name)?;
        if state.in_level() && ctx.board.is_none() {
            return Err(EmblemError::LevelRequired(name));
        }
        self.stack.push(StackEntry {
            state,
            needs_begin: true,
        });
        Ok(())
    }

    fn pop(&mut self, ctx: &mut GameContext) {
        if let Some(mut entry) = self.stack.pop() {
            entry.state.end(ctx);
        }
    }

    /// Draw the topmost run of transparent states and the first opaque
    /// state beneath them, bottom-up, over the map when the lowest of
    /// them shows it
    pub fn draw(&self, surface: &mut dyn Surface, ctx: &GameContext) {
        surface.fill(colors::BACKGROUND);
        let Some(mut lowest) = self.stack.len().checked_sub(1) else {
            return;
        };
        while lowest > 0 && self.stack[lowest].state.transparent() {
            lowest -= 1;
        }

        if self.stack[lowest].state.show_map() && ctx.board.is_some() {
            draw_map(surface, ctx);
        }
        for entry in &self.stack[lowest..] {
            entry.state.draw(surface, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::data::{Constants, Database};
    use crate::map::GameBoard;
    use crate::render::RecordingSurface;

    /// Pops itself on Back, pushes the options menu on Select
    struct Probe(StateName);

    impl GameState for Probe {
        fn name(&self) -> StateName {
            self.0
        }

        fn in_level(&self) -> bool {
            false
        }

        fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
            match input {
                Some(InputEvent::Back) => ctx.back(),
                Some(InputEvent::Select) => ctx.push(StateName::OptionsMenu),
                _ => {}
            }
            Ok(StateResult::Idle)
        }

        fn draw(&self, surface: &mut dyn Surface, _ctx: &GameContext) {
            surface.text(&format!("{:?}", self.0), glam::Vec2::ZERO, colors::WHITE, 8);
        }
    }

    /// Transparent overlay
    struct Overlay;

    impl GameState for Overlay {
        fn name(&self) -> StateName {
            StateName::OptionsMenu
        }

        fn transparent(&self) -> bool {
            true
        }

        fn in_level(&self) -> bool {
            false
        }

        fn take_input(&mut self, input: Option<InputEvent>, ctx: &mut GameContext) -> Result<StateResult> {
            if input == Some(InputEvent::Back) {
                ctx.back();
            }
            Ok(StateResult::Idle)
        }

        fn draw(&self, surface: &mut dyn Surface, _ctx: &GameContext) {
            surface.text("overlay", glam::Vec2::ZERO, colors::WHITE, 8);
        }
    }

    /// Asks for re-entry forever
    struct Spinner;

    impl GameState for Spinner {
        fn name(&self) -> StateName {
            StateName::PhaseBanner
        }

        fn in_level(&self) -> bool {
            false
        }

        fn update(&mut self, _ctx: &mut GameContext) -> Result<StateResult> {
            Ok(StateResult::Repeat)
        }
    }

    struct NeedsLevel;

    impl GameState for NeedsLevel {
        fn name(&self) -> StateName {
            StateName::MoveSelect
        }
    }

    fn free_cursor() -> Box<dyn GameState> {
        Box::new(Probe(StateName::FreeCursor))
    }

    fn turn_change() -> Box<dyn GameState> {
        Box::new(Probe(StateName::TurnChange))
    }

    fn overlay() -> Box<dyn GameState> {
        Box::new(Overlay)
    }

    fn spinner() -> Box<dyn GameState> {
        Box::new(Spinner)
    }

    fn needs_level() -> Box<dyn GameState> {
        Box::new(NeedsLevel)
    }

    fn catalog() -> StateCatalog {
        let mut catalog = StateCatalog::new();
        catalog
            .register(StateName::FreeCursor, free_cursor)
            .register(StateName::TurnChange, turn_change)
            .register(StateName::OptionsMenu, overlay)
            .register(StateName::PhaseBanner, spinner)
            .register(StateName::MoveSelect, needs_level);
        catalog
    }

    fn context() -> GameContext {
        GameContext::new(Database::new(Constants::default()), EngineConfig::default(), 0)
    }

    #[test]
    fn test_push_then_back() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::FreeCursor);
        machine.run_frame(&mut ctx, None).unwrap();
        assert_eq!(machine.top(), Some(StateName::FreeCursor));

        machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();
        assert_eq!(machine.names(), vec![StateName::FreeCursor, StateName::OptionsMenu]);

        // The pushed overlay must not see the Select that created it
        machine.run_frame(&mut ctx, Some(InputEvent::Back)).unwrap();
        assert_eq!(machine.top(), Some(StateName::FreeCursor));
        assert_eq!(ctx.frame, 3);
        assert_eq!(ctx.clock, 48);
    }

    #[test]
    fn test_back_then_change_restores_name() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::FreeCursor);
        ctx.push(StateName::TurnChange);
        machine.run_frame(&mut ctx, None).unwrap();
        assert_eq!(machine.top(), Some(StateName::TurnChange));

        ctx.back();
        ctx.change(StateName::TurnChange);
        machine.run_frame(&mut ctx, None).unwrap();
        assert_eq!(machine.names(), vec![StateName::TurnChange]);
    }

    #[test]
    fn test_unknown_state_is_error() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::ChapterEnd);
        assert!(matches!(
            machine.run_frame(&mut ctx, None),
            Err(EmblemError::UnknownState(StateName::ChapterEnd))
        ));
    }

    #[test]
    fn test_in_level_state_requires_board() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::MoveSelect);
        assert!(matches!(
            machine.run_frame(&mut ctx, None),
            Err(EmblemError::LevelRequired(StateName::MoveSelect))
        ));

        ctx.board = Some(GameBoard::new(3, 3, "plains"));
        ctx.push(StateName::MoveSelect);
        machine.run_frame(&mut ctx, None).unwrap();
        assert_eq!(machine.top(), Some(StateName::MoveSelect));
    }

    #[test]
    fn test_iteration_cap_stops_loop() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::PhaseBanner);
        machine.run_frame(&mut ctx, None).unwrap();
        assert_eq!(machine.top(), Some(StateName::PhaseBanner));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::FreeCursor);
        ctx.push(StateName::TurnChange);
        machine.run_frame(&mut ctx, None).unwrap();
        ctx.clear();
        machine.run_frame(&mut ctx, None).unwrap();
        assert!(machine.is_empty());
    }

    #[test]
    fn test_draw_includes_transparent_run() {
        let mut machine = StateMachine::new(catalog());
        let mut ctx = context();
        ctx.push(StateName::TurnChange);
        ctx.push(StateName::FreeCursor);
        ctx.push(StateName::OptionsMenu);
        machine.run_frame(&mut ctx, None).unwrap();

        let mut surface = RecordingSurface::new();
        machine.draw(&mut surface, &ctx);
        assert_eq!(surface.texts(), vec!["FreeCursor", "overlay"]);
    }
}
