//! End-to-end turn flows driven through the state machine frame by frame

use emblem_tactics::combat::resolve;
use emblem_tactics::core::config::EngineConfig;
use emblem_tactics::core::types::{Team, TilePos, UnitId};
use emblem_tactics::data::{Constants, Database, RankRequirement, RngMode, SupportPrefab};
use emblem_tactics::map::GameBoard;
use emblem_tactics::render::RecordingSurface;
use emblem_tactics::state::{default_catalog, GameContext, InputEvent, StateMachine, StateName};
use emblem_tactics::support::SupportBook;
use emblem_tactics::units::{Item, ItemKind, Stats, StatusEffect, Unit, WeaponStats};

fn weapon(might: i32, uses: u32) -> Item {
    Item {
        id: "training_sword".into(),
        name: "Training Sword".into(),
        kind: ItemKind::Weapon,
        uses: Some(uses),
        weapon: Some(WeaponStats {
            weapon_type: "sword".into(),
            min_range: 1,
            max_range: 1,
            might,
            hit: 100,
            crit: 0,
            weight: 0,
            magic: false,
        }),
        heal: 0,
        stat_effects: Stats::default(),
    }
}

fn unit(id: &str, team: Team, stats: Stats) -> Unit {
    Unit::new(id, team, "soldier", stats)
}

fn place(board: &mut GameBoard, unit: Unit, x: i32, y: i32) {
    let id = unit.id.clone();
    board.insert_unit(unit);
    board.set_unit(&id, TilePos::new(x, y)).unwrap();
}

fn context(board: GameBoard, constants: Constants) -> GameContext {
    let mut ctx = GameContext::new(Database::new(constants), EngineConfig::default(), 42);
    ctx.camera.set_map_size(board.width(), board.height());
    ctx.board = Some(board);
    ctx
}

fn get<'a>(ctx: &'a GameContext, id: &str) -> &'a Unit {
    ctx.unit(&UnitId::from(id)).unwrap()
}

/// Run frames until `done` holds, failing after `limit` frames
fn run_until(machine: &mut StateMachine, ctx: &mut GameContext, limit: usize, done: impl Fn(&StateMachine, &GameContext) -> bool) {
    for _ in 0..limit {
        if done(machine, ctx) {
            return;
        }
        machine.run_frame(ctx, None).unwrap();
    }
    assert!(done(machine, ctx), "condition not reached in {} frames (stack {:?})", limit, machine.names());
}

/// 10x10 plains with P at (3,3), a resting ally and a far-away enemy
fn free_move_setup() -> (StateMachine, GameContext) {
    let mut board = GameBoard::new(10, 10, "plains");
    let mut p = unit("p", Team::player(), Stats { hp: 20, movement: 5, ..Stats::default() });
    p.items.push(weapon(2, 30));
    place(&mut board, p, 3, 3);
    place(&mut board, unit("ally", Team::player(), Stats { hp: 20, movement: 5, ..Stats::default() }), 0, 9);
    place(&mut board, unit("bandit", Team::enemy(), Stats { hp: 20, movement: 5, ..Stats::default() }), 9, 9);
    let mut ctx = context(board, Constants::default());
    ctx.set_cursor(TilePos::new(3, 3));

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::FreeCursor);
    machine.run_frame(&mut ctx, None).unwrap();
    (machine, ctx)
}

/// Select P, walk to (6,3) and wait for the action menu
fn move_to_six_three(machine: &mut StateMachine, ctx: &mut GameContext) {
    machine.run_frame(ctx, Some(InputEvent::Select)).unwrap();
    assert_eq!(machine.top(), Some(StateName::MoveSelect));
    for _ in 0..3 {
        machine.run_frame(ctx, Some(InputEvent::Right)).unwrap();
    }
    assert_eq!(ctx.cursor, TilePos::new(6, 3));
    machine.run_frame(ctx, Some(InputEvent::Select)).unwrap();
    assert_eq!(ctx.move_spent, 3);
    run_until(machine, ctx, 60, |m, _| m.top() == Some(StateName::ActionMenu));
}

#[test]
fn test_free_move_to_wait() {
    let (mut machine, mut ctx) = free_move_setup();
    move_to_six_three(&mut machine, &mut ctx);

    let mut surface = RecordingSurface::new();
    machine.draw(&mut surface, &ctx);
    assert!(surface.has_text("Wait"));
    // armed, but nobody in reach from (6,3)
    assert!(!surface.has_text("Attack"));

    machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();
    let p = get(&ctx, "p");
    assert_eq!(p.position, Some(TilePos::new(6, 3)));
    assert!(p.flags.finished);
    assert_eq!(machine.top(), Some(StateName::FreeCursor));
    assert!(ctx.board.as_ref().unwrap().is_consistent());
}

#[test]
fn test_undo_move() {
    let (mut machine, mut ctx) = free_move_setup();
    move_to_six_three(&mut machine, &mut ctx);

    machine.run_frame(&mut ctx, Some(InputEvent::Back)).unwrap();
    let p = get(&ctx, "p");
    assert_eq!(p.position, Some(TilePos::new(3, 3)));
    assert!(!p.flags.moved);
    assert!(!p.flags.finished);
    assert_eq!(machine.top(), Some(StateName::FreeCursor));
    assert!(ctx.board.as_ref().unwrap().unit_at(TilePos::new(6, 3)).is_none());
}

fn always_hit() -> Constants {
    Constants {
        rng_mode: RngMode::AlwaysHit,
        ..Constants::default()
    }
}

#[test]
fn test_attack_through_menu_and_targeting() {
    let mut board = GameBoard::new(10, 10, "plains");
    let mut p = unit("p", Team::player(), Stats { hp: 20, movement: 5, ..Stats::default() });
    p.items.push(weapon(2, 30));
    place(&mut board, p, 3, 3);
    place(&mut board, unit("ally", Team::player(), Stats { hp: 20, ..Stats::default() }), 0, 9);
    place(&mut board, unit("e1", Team::enemy(), Stats { hp: 30, ..Stats::default() }), 7, 3);
    place(&mut board, unit("e2", Team::enemy(), Stats { hp: 30, ..Stats::default() }), 6, 4);
    let mut ctx = context(board, always_hit());
    ctx.set_cursor(TilePos::new(3, 3));
    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::FreeCursor);
    machine.run_frame(&mut ctx, None).unwrap();

    move_to_six_three(&mut machine, &mut ctx);
    let mut surface = RecordingSurface::new();
    machine.draw(&mut surface, &ctx);
    assert!(surface.has_text("Attack"));

    // Attack is the first entry
    machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();
    assert_eq!(machine.top(), Some(StateName::Targeting));
    assert_eq!(ctx.cursor, TilePos::new(7, 3));
    surface.clear();
    machine.draw(&mut surface, &ctx);
    assert!(surface.has_text("Dmg"));

    machine.run_frame(&mut ctx, Some(InputEvent::Down)).unwrap();
    assert_eq!(ctx.cursor, TilePos::new(6, 4));
    machine.run_frame(&mut ctx, Some(InputEvent::Select)).unwrap();
    assert_eq!(machine.names(), vec![StateName::FreeCursor, StateName::CombatPlayback]);
    assert_eq!(ctx.combat_target, Some(UnitId::from("e2")));

    run_until(&mut machine, &mut ctx, 400, |m, _| m.top() != Some(StateName::CombatPlayback));
    assert_eq!(machine.names(), vec![StateName::FreeCursor]);
    let p = get(&ctx, "p");
    assert!(p.flags.attacked);
    assert!(p.flags.finished);
    assert_eq!(p.items[0].uses, Some(29));
    assert_eq!(get(&ctx, "e2").current_hp, 28);
    assert_eq!(get(&ctx, "e1").current_hp, 30);
}

#[test]
fn test_lethal_hit_record() {
    let mut board = GameBoard::new(6, 6, "plains");
    let mut a = unit("a", Team::player(), Stats { hp: 20, movement: 5, ..Stats::default() });
    a.items.push(weapon(10, 30));
    place(&mut board, a, 2, 2);
    place(&mut board, unit("d", Team::enemy(), Stats { hp: 8, defense: 2, ..Stats::default() }), 2, 3);
    let ctx = context(board, always_hit());

    let mut rng = rand::thread_rng();
    let record = resolve(
        ctx.board.as_ref().unwrap(),
        &ctx.db,
        None,
        &UnitId::from("a"),
        &UnitId::from("d"),
        &mut rng,
    )
    .unwrap();
    assert_eq!(record.strikes.len(), 1);
    assert_eq!(record.strikes[0].damage, 8);
    assert_eq!(record.final_hp[1], 0);
    assert_eq!(record.dead, [false, true]);
}

#[test]
fn test_lethal_hit_cleanup() {
    let mut board = GameBoard::new(6, 6, "plains");
    let mut a = unit("a", Team::player(), Stats { hp: 20, movement: 5, ..Stats::default() });
    a.items.push(weapon(10, 30));
    place(&mut board, a, 2, 2);
    place(&mut board, unit("ally", Team::player(), Stats { hp: 20, ..Stats::default() }), 0, 0);
    place(&mut board, unit("d", Team::enemy(), Stats { hp: 8, defense: 2, ..Stats::default() }), 2, 3);
    place(&mut board, unit("reserve", Team::enemy(), Stats { hp: 8, ..Stats::default() }), 5, 5);
    let mut ctx = context(board, always_hit());
    ctx.selected_unit = Some("a".into());
    ctx.combat_target = Some("d".into());

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::FreeCursor);
    ctx.push(StateName::CombatPlayback);
    run_until(&mut machine, &mut ctx, 400, |m, _| m.top() == Some(StateName::FreeCursor));

    let d = get(&ctx, "d");
    assert_eq!(d.current_hp, 0);
    assert!(d.flags.dead);
    assert!(d.position.is_none());
    assert!(ctx.board.as_ref().unwrap().unit_at(TilePos::new(2, 3)).is_none());
    let a = get(&ctx, "a");
    assert!(a.flags.finished);
    assert_eq!(a.items[0].uses, Some(29));
    assert!(ctx.outcome.is_none());
}

#[test]
fn test_last_weapon_use_breaks() {
    let mut board = GameBoard::new(6, 6, "plains");
    let mut a = unit("a", Team::player(), Stats { hp: 20, ..Stats::default() });
    a.items.push(weapon(1, 1));
    place(&mut board, a, 2, 2);
    place(&mut board, unit("d", Team::enemy(), Stats { hp: 30, ..Stats::default() }), 2, 3);
    let mut ctx = context(board, always_hit());

    let record = resolve(
        ctx.board.as_ref().unwrap(),
        &ctx.db,
        None,
        &UnitId::from("a"),
        &UnitId::from("d"),
        &mut ctx.rng,
    )
    .unwrap();
    record.apply(ctx.board.as_mut().unwrap(), &ctx.db).unwrap();
    assert!(get(&ctx, "a").items.is_empty());
    assert_eq!(get(&ctx, "d").current_hp, 29);
}

#[test]
fn test_canto_reentry() {
    let mut board = GameBoard::new(8, 8, "plains");
    let mut rider = unit("rider", Team::player(), Stats { hp: 20, movement: 6, ..Stats::default() });
    rider.flags.has_canto = true;
    rider.flags.moved = true;
    rider.items.push(weapon(1, 30));
    place(&mut board, rider, 2, 2);
    place(&mut board, unit("d", Team::enemy(), Stats { hp: 30, ..Stats::default() }), 3, 2);
    let mut ctx = context(board, always_hit());
    ctx.selected_unit = Some("rider".into());
    ctx.combat_target = Some("d".into());
    ctx.move_spent = 2;

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::FreeCursor);
    ctx.push(StateName::CombatPlayback);
    machine.run_frame(&mut ctx, None).unwrap();
    assert_eq!(machine.top(), Some(StateName::CombatPlayback));
    run_until(&mut machine, &mut ctx, 400, |m, _| m.top() != Some(StateName::CombatPlayback));

    assert_eq!(machine.names(), vec![StateName::FreeCursor, StateName::MoveSelect]);
    assert_eq!(ctx.selected_unit, Some(UnitId::from("rider")));
    assert_eq!(ctx.canto, Some(4));
    assert!(get(&ctx, "rider").flags.attacked);
}

#[test]
fn test_ai_phase_completion() {
    let mut board = GameBoard::new(10, 10, "plains");
    place(&mut board, unit("p", Team::player(), Stats { hp: 20, ..Stats::default() }), 0, 0);
    for (id, y) in [("e1", 8), ("e2", 9)] {
        let mut enemy = unit(id, Team::enemy(), Stats { hp: 20, movement: 3, ..Stats::default() });
        enemy.ai = "defend".into();
        place(&mut board, enemy, 9, y);
    }
    let mut ctx = context(board, Constants::default());
    ctx.phase.advance(|_| true);
    assert!(ctx.phase.is_player_phase());

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::TurnChange);
    machine.run_frame(&mut ctx, None).unwrap();
    assert_eq!(machine.names(), vec![StateName::AiPhase, StateName::PhaseBanner]);

    run_until(&mut machine, &mut ctx, 400, |_, ctx| ctx.phase.is_player_phase());
    assert!(get(&ctx, "e1").flags.finished);
    assert!(get(&ctx, "e2").flags.finished);
    assert_eq!(get(&ctx, "e1").position, Some(TilePos::new(9, 8)));
    assert_eq!(ctx.phase.turn(), 2);
    assert_eq!(machine.names(), vec![StateName::FreeCursor, StateName::PhaseBanner]);
}

#[test]
fn test_ai_phase_attacks_and_finishes() {
    let mut board = GameBoard::new(10, 10, "plains");
    place(&mut board, unit("p", Team::player(), Stats { hp: 20, ..Stats::default() }), 2, 2);
    place(&mut board, unit("q", Team::player(), Stats { hp: 20, ..Stats::default() }), 9, 9);
    let mut raider = unit("raider", Team::enemy(), Stats { hp: 20, strength: 1, movement: 5, ..Stats::default() });
    raider.ai = "pursue".into();
    raider.items.push(weapon(2, 30));
    place(&mut board, raider, 5, 2);
    let mut ctx = context(board, always_hit());
    ctx.phase.advance(|_| true);

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::TurnChange);
    machine.run_frame(&mut ctx, None).unwrap();
    assert!(!ctx.phase.is_player_phase());

    run_until(&mut machine, &mut ctx, 2000, |_, ctx| ctx.phase.is_player_phase());
    assert_eq!(ctx.phase.turn(), 2);
    assert!(ctx.board.as_ref().unwrap().is_consistent());

    let raider = get(&ctx, "raider");
    assert!(raider.flags.moved);
    assert!(raider.flags.attacked);
    assert_eq!(raider.position.map(|pos| pos.distance(&TilePos::new(2, 2))), Some(1));
    assert_eq!(raider.items[0].uses, Some(29));
    assert_eq!(get(&ctx, "p").current_hp, 17);
    assert_eq!(get(&ctx, "q").current_hp, 20);
}

#[test]
fn test_ai_phase_skips_unit_killed_by_poison() {
    let mut board = GameBoard::new(10, 10, "plains");
    place(&mut board, unit("p", Team::player(), Stats { hp: 20, ..Stats::default() }), 0, 0);
    let mut sick = unit("sick", Team::enemy(), Stats { hp: 5, movement: 5, ..Stats::default() });
    sick.ai = "pursue".into();
    sick.items.push(weapon(2, 30));
    sick.statuses.push(StatusEffect::new("poison", 10, 3));
    place(&mut board, sick, 2, 0);
    let mut guard = unit("guard", Team::enemy(), Stats { hp: 20, movement: 3, ..Stats::default() });
    guard.ai = "defend".into();
    place(&mut board, guard, 9, 9);
    let mut ctx = context(board, always_hit());
    ctx.phase.advance(|_| true);

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::TurnChange);
    run_until(&mut machine, &mut ctx, 400, |_, ctx| ctx.phase.turn() == 2);

    let sick = get(&ctx, "sick");
    assert!(sick.flags.dead);
    assert!(!sick.flags.attacked);
    assert_eq!(sick.position, None);
    assert_eq!(get(&ctx, "p").current_hp, 20);
    assert!(get(&ctx, "guard").flags.finished);
    assert!(ctx.outcome.is_none());
}

#[test]
fn test_autoplay_canto_rider_ends_player_phase() {
    let mut board = GameBoard::new(8, 8, "plains");
    let mut rider = unit("rider", Team::player(), Stats { hp: 20, movement: 6, ..Stats::default() });
    rider.flags.has_canto = true;
    rider.ai = "defend".into();
    rider.items.push(weapon(1, 30));
    place(&mut board, rider, 2, 2);
    place(&mut board, unit("d", Team::enemy(), Stats { hp: 30, ..Stats::default() }), 3, 2);
    let mut ctx = context(board, always_hit());
    ctx.config.autoplay = true;

    let mut machine = StateMachine::new(default_catalog());
    ctx.push(StateName::TurnChange);
    machine.run_frame(&mut ctx, None).unwrap();
    assert_eq!(machine.names(), vec![StateName::AiPhase, StateName::PhaseBanner]);

    run_until(&mut machine, &mut ctx, 3000, |_, ctx| !ctx.phase.is_player_phase());
    assert!(!machine.names().contains(&StateName::MoveSelect));
    let rider = get(&ctx, "rider");
    assert!(rider.flags.attacked);
    assert!(rider.flags.finished);
    assert_eq!(get(&ctx, "d").current_hp, 29);
}

#[test]
fn test_support_rank_unlock() {
    let mut constants = Constants::default();
    constants.support.end_turn_points = 10;
    let mut db = Database::new(constants);
    db.add_support(SupportPrefab {
        unit_a: "u1".into(),
        unit_b: "u2".into(),
        ranks: vec![RankRequirement {
            rank: "C".into(),
            requirement: 20,
            gate: None,
            bonus: None,
        }],
    });
    let mut board = GameBoard::new(5, 5, "plains");
    place(&mut board, unit("u1", Team::player(), Stats { hp: 10, ..Stats::default() }), 1, 1);
    place(&mut board, unit("u2", Team::player(), Stats { hp: 10, ..Stats::default() }), 1, 2);

    let (u1, u2) = (UnitId::from("u1"), UnitId::from("u2"));
    let mut book = SupportBook::from_database(&db);
    book.end_turn(&board, &db);
    assert!(book.pair(&u1, &u2).unwrap().locked_ranks.is_empty());
    let earned = book.end_turn(&board, &db);
    assert_eq!(earned.len(), 1);

    let pair = book.pair(&u1, &u2).unwrap();
    assert_eq!(pair.locked_ranks, vec!["C".to_string()]);
    assert!(pair.unlocked_ranks.is_empty());
    assert!(book.can_support(&db, &u1, &u2));

    assert!(book.unlock_rank(&db, &u1, &u2, "C"));
    let pair = book.pair(&u1, &u2).unwrap();
    assert_eq!(pair.unlocked_ranks, vec!["C".to_string()]);
    assert_eq!(pair.ranks_this_chapter, 1);
    assert!(!book.can_support(&db, &u1, &u2));
}

#[test]
fn test_back_then_change_restores_top() {
    let (mut machine, mut ctx) = free_move_setup();
    ctx.back();
    ctx.change(StateName::FreeCursor);
    machine.run_frame(&mut ctx, None).unwrap();
    assert_eq!(machine.top(), Some(StateName::FreeCursor));
}
