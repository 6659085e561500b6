//! Picks the combat protocol for a fight and drives it uniformly

use crate::combat::animation::{AnimationCombat, RenderState, SideAssets};
use crate::combat::engine::{CombatRecord, Side};
use crate::combat::map_combat::MapCombat;
use crate::combat::offsets::CombatOffsets;
use crate::core::config::EngineConfig;
use crate::core::types::{Millis, UnitId};
use crate::data::Database;
use crate::map::GameBoard;

#[derive(Debug, Clone)]
pub enum CombatScene {
    Map(MapCombat),
    Animated(AnimationCombat),
}

/// Animation content for one side, if the database has all of it
fn side_assets(board: &GameBoard, db: &Database, unit: &UnitId) -> Option<SideAssets> {
    let unit = board.unit(unit)?;
    let anim_id = db.class(&unit.class_id)?.combat_anim.as_deref()?;
    let Some(anim) = db.combat_anim(anim_id) else {
        tracing::warn!("Class '{}' names unknown combat animation '{}'", unit.class_id, anim_id);
        return None;
    };
    let Some(palette) = db.palette(&anim.palette) else {
        tracing::warn!("Combat animation '{}' names unknown palette '{}'", anim.id, anim.palette);
        return None;
    };
    let platform = unit
        .position
        .and_then(|p| board.terrain(p))
        .and_then(|t| db.terrain(t))
        .and_then(|t| t.platform.clone());

    Some(SideAssets {
        anim: anim.clone(),
        palette: palette.colors.clone(),
        platform,
    })
}

impl CombatScene {
    /// Animated when enabled and both sides have valid animations,
    /// otherwise map combat
    pub fn start(board: &GameBoard, db: &Database, config: &EngineConfig, record: CombatRecord) -> Self {
        if config.animated_combat {
            let attacker = side_assets(board, db, &record.attacker);
            let defender = side_assets(board, db, &record.defender);
            if let (Some(a), Some(d)) = (attacker, defender) {
                return CombatScene::Animated(AnimationCombat::new(record, [a, d], config.death_fade_ms));
            }
        }
        CombatScene::Map(MapCombat::new(record, config.map_strike_ms))
    }

    pub fn update(&mut self, dt: Millis) -> bool {
        match self {
            CombatScene::Map(combat) => combat.update(dt),
            CombatScene::Animated(combat) => combat.update(dt),
        }
    }

    pub fn record(&self) -> &CombatRecord {
        match self {
            CombatScene::Map(combat) => combat.apply_results(),
            CombatScene::Animated(combat) => combat.record(),
        }
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        match self {
            CombatScene::Map(_) => None,
            CombatScene::Animated(combat) => Some(combat.render_state()),
        }
    }

    /// HP currently shown for a side
    pub fn displayed_hp(&self, side: Side) -> i32 {
        match self {
            CombatScene::Map(combat) => combat.displayed_hp(side),
            CombatScene::Animated(combat) => combat.render_state().sides[side.index()].hp,
        }
    }

    pub fn write_offsets(&self, offsets: &mut CombatOffsets) {
        match self {
            CombatScene::Map(combat) => combat.write_offsets(offsets),
            CombatScene::Animated(combat) => combat.write_offsets(offsets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Team, TilePos};
    use crate::data::{ClassDef, CombatAnimDef, Constants, PaletteDef};
    use crate::units::{Stats, Unit};

    fn board() -> GameBoard {
        let mut board = GameBoard::new(4, 4, "plains");
        for (id, team, pos) in [("a", Team::player(), TilePos::new(0, 0)), ("d", Team::enemy(), TilePos::new(1, 0))] {
            board.insert_unit(Unit::new(id, team, "myrmidon", Stats { hp: 10, ..Stats::default() }));
            board.set_unit(&id.into(), pos).unwrap();
        }
        board
    }

    fn record() -> CombatRecord {
        CombatRecord {
            attacker: "a".into(),
            defender: "d".into(),
            attacker_pos: TilePos::new(0, 0),
            defender_pos: TilePos::new(1, 0),
            start_hp: [10, 10],
            max_hp: [10, 10],
            strikes: Vec::new(),
            final_hp: [10, 10],
            dead: [false, false],
            weapon_index: [None, None],
            uses_spent: [0, 0],
            exp: Vec::new(),
        }
    }

    fn class(anim: Option<&str>) -> ClassDef {
        ClassDef {
            id: "myrmidon".into(),
            name: "Myrmidon".into(),
            movement_group: "infantry".into(),
            combat_anim: anim.map(String::from),
            canto: false,
        }
    }

    #[test]
    fn test_falls_back_to_map_combat() {
        let config = EngineConfig::default();
        let mut db = Database::new(Constants::default());
        db.add_class(class(None));
        assert!(matches!(CombatScene::start(&board(), &db, &config, record()), CombatScene::Map(_)));

        // Named animation missing from the database
        db.add_class(class(Some("myrmidon_sword")));
        assert!(matches!(CombatScene::start(&board(), &db, &config, record()), CombatScene::Map(_)));
    }

    #[test]
    fn test_animated_when_content_complete() {
        let config = EngineConfig::default();
        let mut db = Database::new(Constants::default());
        db.add_class(class(Some("myrmidon_sword")));
        db.combat_anims.insert(
            "myrmidon_sword".into(),
            CombatAnimDef {
                id: "myrmidon_sword".into(),
                palette: "blue".into(),
                anticipation_ms: 100,
                lunge_ms: 100,
                impact_ms: 100,
                recoil_ms: 100,
                lunge_distance: 16.0,
            },
        );
        // Palette still missing
        assert!(matches!(CombatScene::start(&board(), &db, &config, record()), CombatScene::Map(_)));

        db.palettes.insert(
            "blue".into(),
            PaletteDef {
                id: "blue".into(),
                colors: vec![[0, 0, 200]],
            },
        );
        let scene = CombatScene::start(&board(), &db, &config, record());
        assert!(scene.render_state().is_some());

        let map_only = EngineConfig {
            animated_combat: false,
            ..EngineConfig::default()
        };
        assert!(matches!(CombatScene::start(&board(), &db, &map_only, record()), CombatScene::Map(_)));
    }
}
