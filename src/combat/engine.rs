//! Combat resolution: strike list, record and application
//!
//! `resolve` computes the whole fight from snapshots and never touches the
//! board. The playback states show the record and call `apply` when the
//! scene ends.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::exp::{apply_award, award, ExpAward};
use crate::combat::formulas::{crit_chance, damage, doubles, hit_chance, Combatant};
use crate::combat::rng::{roll_crit, roll_hit};
use crate::core::error::{EmblemError, Result};
use crate::core::types::{TilePos, UnitId};
use crate::data::Database;
use crate::map::GameBoard;
use crate::support::SupportBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Attacker => 0,
            Side::Defender => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub side: Side,
    pub hit: bool,
    pub crit: bool,
    pub damage: i32,
    /// Target's HP after this strike
    pub target_hp: i32,
}

/// Everything that happens in one combat, computed up front
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub attacker_pos: TilePos,
    pub defender_pos: TilePos,
    /// HP of each side before the first strike
    pub start_hp: [i32; 2],
    pub max_hp: [i32; 2],
    pub strikes: Vec<Strike>,
    /// HP of each side after the last strike
    pub final_hp: [i32; 2],
    pub dead: [bool; 2],
    /// Inventory slot of each side's weapon
    pub weapon_index: [Option<usize>; 2],
    /// Weapon uses each side spent
    pub uses_spent: [u32; 2],
    pub exp: Vec<ExpAward>,
}

impl CombatRecord {
    fn empty(attacker: &Combatant, defender: &Combatant) -> Self {
        Self {
            attacker: attacker.id.clone(),
            defender: defender.id.clone(),
            attacker_pos: attacker.position,
            defender_pos: defender.position,
            start_hp: [attacker.hp, defender.hp],
            max_hp: [attacker.max_hp(), defender.max_hp()],
            strikes: Vec::new(),
            final_hp: [attacker.hp, defender.hp],
            dead: [false, false],
            weapon_index: [attacker.weapon_index, defender.weapon_index],
            uses_spent: [0, 0],
            exp: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    pub fn unit(&self, side: Side) -> &UnitId {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn position(&self, side: Side) -> TilePos {
        match side {
            Side::Attacker => self.attacker_pos,
            Side::Defender => self.defender_pos,
        }
    }

    pub fn is_dead(&self, side: Side) -> bool {
        self.dead[side.index()]
    }

    pub fn any_dead(&self) -> bool {
        self.dead.iter().any(|d| *d)
    }

    pub fn exp_for(&self, unit: &UnitId) -> Option<&ExpAward> {
        self.exp.iter().find(|a| &a.unit == unit)
    }

    pub fn has_level_up(&self) -> bool {
        self.exp.iter().any(|a| a.gains.is_some())
    }

    fn dealt_damage(&self, side: Side) -> bool {
        self.strikes.iter().any(|s| s.side == side && s.damage > 0)
    }

    /// Write HP, weapon wear, EXP and deaths into the board
    pub fn apply(&self, board: &mut GameBoard, db: &Database) -> Result<()> {
        for side in [Side::Attacker, Side::Defender] {
            let id = self.unit(side);
            let i = side.index();
            let unit = board
                .unit_mut(id)
                .ok_or_else(|| EmblemError::UnitNotFound(id.clone()))?;
            unit.set_hp(self.final_hp[i]);

            if let Some(slot) = self.weapon_index[i] {
                let mut broke = false;
                if let Some(item) = unit.items.get_mut(slot) {
                    for _ in 0..self.uses_spent[i] {
                        broke |= item.consume_use();
                    }
                }
                if broke {
                    if let Some(item) = unit.take_item(slot) {
                        tracing::info!("{}'s {} broke", unit.name, item.name);
                    }
                }
            }

            if let Some(award) = self.exp_for(id) {
                apply_award(unit, award);
            }
        }

        for side in [Side::Attacker, Side::Defender] {
            if self.is_dead(side) {
                board.kill_unit(self.unit(side), db)?;
            }
        }
        Ok(())
    }
}

/// Simulate a fight between two units on the board
pub fn resolve<R: Rng + ?Sized>(
    board: &GameBoard,
    db: &Database,
    support: Option<&SupportBook>,
    attacker: &UnitId,
    defender: &UnitId,
    rng: &mut R,
) -> Result<CombatRecord> {
    let constants = &db.constants;
    let mut fighters = [
        Combatant::from_board(board, db, support, attacker)?,
        Combatant::from_board(board, db, support, defender)?,
    ];
    let mut record = CombatRecord::empty(&fighters[0], &fighters[1]);

    if !fighters[0].reaches(fighters[1].position) {
        tracing::debug!("{} cannot reach {}; no strikes", attacker, defender);
        return Ok(record);
    }

    let counters = fighters[1].reaches(fighters[0].position);
    let mut order = vec![Side::Attacker];
    if counters {
        order.push(Side::Defender);
    }
    if doubles(constants, &fighters[0], &fighters[1]) {
        order.push(Side::Attacker);
    }
    if counters && doubles(constants, &fighters[1], &fighters[0]) {
        order.push(Side::Defender);
    }

    for side in order {
        let (me, them) = (side.index(), side.other().index());
        if fighters[me].hp <= 0 || fighters[them].hp <= 0 {
            break;
        }
        // The weapon may have broken on an earlier strike
        if !fighters[me].reaches(fighters[them].position) {
            continue;
        }

        let hit_pct = hit_chance(constants, &fighters[me], &fighters[them]);
        let hit = roll_hit(constants.rng_mode, hit_pct, rng);
        let (crit, dealt) = if hit {
            let crit = roll_crit(constants.rng_mode, crit_chance(&fighters[me], &fighters[them]), rng);
            let base = damage(&fighters[me], &fighters[them]);
            (crit, if crit { base * constants.crit_multiplier } else { base })
        } else {
            (false, 0)
        };

        if hit {
            if let Some(uses) = fighters[me].uses.as_mut() {
                *uses = uses.saturating_sub(1);
            }
            record.uses_spent[me] += 1;
        }
        fighters[them].hp = (fighters[them].hp - dealt).max(0);

        record.strikes.push(Strike {
            side,
            hit,
            crit,
            damage: dealt,
            target_hp: fighters[them].hp,
        });
    }

    record.final_hp = [fighters[0].hp, fighters[1].hp];
    record.dead = [fighters[0].hp == 0, fighters[1].hp == 0];

    for side in [Side::Attacker, Side::Defender] {
        if record.is_dead(side) {
            continue;
        }
        let Some(unit) = board.unit(record.unit(side)) else {
            continue;
        };
        let enemy_level = fighters[side.other().index()].level;
        let dealt = record.dealt_damage(side);
        let killed = record.is_dead(side.other());
        if let Some(award) = award(constants, unit, enemy_level, dealt, killed, rng) {
            record.exp.push(award);
        }
    }

    tracing::info!(
        "Combat {} vs {}: {} strikes, HP {} / {}",
        attacker,
        defender,
        record.strikes.len(),
        record.final_hp[0],
        record.final_hp[1]
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Team;
    use crate::data::{Constants, RngMode};
    use crate::units::{Item, ItemKind, Stats, Unit, WeaponStats};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn weapon(might: i32, uses: u32) -> Item {
        Item {
            id: "blade".into(),
            name: "Blade".into(),
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

    fn setup(mode: RngMode) -> (GameBoard, Database) {
        let db = Database::new(Constants {
            rng_mode: mode,
            ..Constants::default()
        });
        let mut board = GameBoard::new(6, 6, "plains");

        let mut a = Unit::new("a", Team::player(), "fighter", Stats { hp: 20, ..Stats::default() });
        a.items.push(weapon(10, 40));
        board.insert_unit(a);
        board.set_unit(&"a".into(), TilePos::new(2, 2)).unwrap();

        let d = Unit::new(
            "d",
            Team::enemy(),
            "brigand",
            Stats {
                hp: 8,
                defense: 2,
                ..Stats::default()
            },
        );
        board.insert_unit(d);
        board.set_unit(&"d".into(), TilePos::new(2, 3)).unwrap();
        (board, db)
    }

    #[test]
    fn test_lethal_single_strike() {
        let (mut board, db) = setup(RngMode::AlwaysHit);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let record = resolve(&board, &db, None, &"a".into(), &"d".into(), &mut rng).unwrap();
        assert_eq!(record.strikes.len(), 1);
        assert_eq!(record.strikes[0].damage, 8);
        assert_eq!(record.final_hp[1], 0);
        assert!(record.is_dead(Side::Defender));
        // Nothing applied yet
        assert_eq!(board.unit(&"d".into()).unwrap().current_hp, 8);

        record.apply(&mut board, &db).unwrap();
        let d = board.unit(&"d".into()).unwrap();
        assert!(d.flags.dead);
        assert!(!board.is_occupied(TilePos::new(2, 3)));
        assert_eq!(board.unit(&"a".into()).unwrap().items[0].uses, Some(39));
        assert!(board.is_consistent());
    }

    #[test]
    fn test_unarmed_attacker_empty_record() {
        let (mut board, db) = setup(RngMode::AlwaysHit);
        board.unit_mut(&"a".into()).unwrap().items.clear();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let record = resolve(&board, &db, None, &"a".into(), &"d".into(), &mut rng).unwrap();
        assert!(record.is_empty());
        assert_eq!(record.final_hp, record.start_hp);
    }

    #[test]
    fn test_single_use_weapon_breaks_on_hit() {
        let (mut board, db) = setup(RngMode::AlwaysHit);
        board.unit_mut(&"a".into()).unwrap().items[0] = weapon(1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let record = resolve(&board, &db, None, &"a".into(), &"d".into(), &mut rng).unwrap();
        assert_eq!(record.uses_spent[0], 1);
        record.apply(&mut board, &db).unwrap();
        assert!(board.unit(&"a".into()).unwrap().items.is_empty());
    }

    #[test]
    fn test_miss_keeps_uses() {
        let (mut board, db) = setup(RngMode::Fair);
        {
            let a = board.unit_mut(&"a".into()).unwrap();
            a.items[0] = weapon(1, 1);
            if let Some(w) = a.items[0].weapon.as_mut() {
                w.hit = 0;
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let record = resolve(&board, &db, None, &"a".into(), &"d".into(), &mut rng).unwrap();
        assert!(!record.strikes[0].hit);
        assert_eq!(record.uses_spent[0], 0);
        record.apply(&mut board, &db).unwrap();
        assert_eq!(board.unit(&"a".into()).unwrap().items[0].uses, Some(1));
    }

    #[test]
    fn test_counter_and_double() {
        let (mut board, db) = setup(RngMode::AlwaysHit);
        {
            let d = board.unit_mut(&"d".into()).unwrap();
            d.stats.hp = 40;
            d.current_hp = 40;
            d.stats.speed = 5;
            d.items.push(weapon(3, 10));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let record = resolve(&board, &db, None, &"a".into(), &"d".into(), &mut rng).unwrap();

        let sides: Vec<Side> = record.strikes.iter().map(|s| s.side).collect();
        assert_eq!(sides, vec![Side::Attacker, Side::Defender, Side::Defender]);
        assert_eq!(record.final_hp, [14, 32]);
        // Attacker survived and dealt damage: player EXP
        assert_eq!(record.exp_for(&"a".into()).unwrap().amount, 10);
        assert!(record.exp_for(&"d".into()).is_none());
    }
}
