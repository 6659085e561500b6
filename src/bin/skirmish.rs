//! Headless Skirmish Runner
//!
//! Loads a database and a chapter, lets the AI play every team for a
//! number of turns and prints a JSON summary.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use emblem_tactics::core::config::EngineConfig;
use emblem_tactics::core::error::{EmblemError, Result};
use emblem_tactics::data::{Database, LevelPrefab};
use emblem_tactics::render::RecordingSurface;
use emblem_tactics::state::{default_catalog, GameContext, InputEvent, SaveSnapshot, StateMachine, StateName};

/// Headless Skirmish Runner - AI vs AI chapter playback
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Autoplay a chapter headlessly and print a JSON summary")]
struct Args {
    /// Content database (TOML)
    #[arg(long, default_value = "data/database.toml")]
    database: PathBuf,

    /// Chapter layout (TOML)
    #[arg(long, default_value = "data/levels/skirmish.toml")]
    level: PathBuf,

    /// Engine configuration overrides (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many turns without a result
    #[arg(long, default_value_t = 20)]
    turns: u32,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Include the full save snapshot in the output
    #[arg(long)]
    snapshot: bool,

    /// Draw every frame into a recording surface
    #[arg(long)]
    draw: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishResult {
    level: String,
    outcome: String,
    turn: u32,
    frames: u64,
    game_time_ms: u64,
    seed: u64,
    /// Living unit names per team
    survivors: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<SaveSnapshot>,
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    config.autoplay = true;
    config.validate().map_err(EmblemError::Content)?;
    Ok(config)
}

fn run(args: &Args) -> Result<SkirmishResult> {
    let db = Database::load(&args.database)?;
    let level = LevelPrefab::load(&args.level)?;
    let config = load_config(args.config.as_ref())?;

    let mut ctx = GameContext::new(db, config, args.seed);
    ctx.load_level(&level)?;
    let mut machine = StateMachine::new(default_catalog());
    let mut surface = RecordingSurface::new();
    ctx.push(StateName::TurnChange);

    // One turn of a small chapter takes a few thousand frames
    let frame_limit = u64::from(args.turns.max(1)) * 20_000;
    while ctx.frame < frame_limit {
        // Nobody is at the keyboard: confirm every dialog line
        let key = (machine.top() == Some(StateName::EventPlayback)).then_some(InputEvent::Select);
        machine.run_frame(&mut ctx, key)?;
        if args.draw {
            surface.clear();
            machine.draw(&mut surface, &ctx);
        }

        if machine.is_empty() {
            break;
        }
        if ctx.outcome.is_none() && ctx.phase.turn() > args.turns {
            tracing::info!("Turn limit of {} reached", args.turns);
            break;
        }
    }

    let mut survivors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(board) = ctx.board.as_ref() {
        for unit in board.all_units().filter(|u| u.is_alive()) {
            survivors.entry(unit.team.to_string()).or_default().push(unit.name.clone());
        }
    }

    Ok(SkirmishResult {
        level: level.id.clone(),
        outcome: ctx
            .outcome
            .map_or_else(|| "undecided".to_string(), |o| format!("{:?}", o).to_lowercase()),
        turn: ctx.phase.turn(),
        frames: ctx.frame,
        game_time_ms: ctx.clock,
        seed: args.seed,
        survivors,
        snapshot: args.snapshot.then(|| ctx.snapshot()),
    })
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("emblem_tactics=info")))
        .with_writer(std::io::stderr)
        .init();

    match run(&args).and_then(|result| Ok(serde_json::to_string_pretty(&result)?)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("skirmish failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
