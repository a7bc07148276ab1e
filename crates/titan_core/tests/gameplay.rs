//! End-to-end gameplay rules, driven through the public API.

use proptest::prelude::*;
use titan_core::archetype::{Ability, ArchetypeData, ArchetypeId};
use titan_core::command::PlayerCommand;
use titan_core::config::GameConfig;
use titan_core::error::GameError;
use titan_core::replay::{Recorder, Replay, ReplayPlayer};
use titan_core::simulation::{GameStatus, Simulation};
use titan_core::unit::Team;
use titan_core::upgrades::UpgradeKind;
use titan_core::wave::WaveDefinition;
use titan_test_utils::fixtures::{
    archetypes, no_drift_config, place_unit, quiet_simulation, tick_until,
};

fn one_hp_config() -> GameConfig {
    let mut config = no_drift_config();
    config.archetypes = Some(vec![ArchetypeData {
        name: "Dummy".to_string(),
        cost: 5,
        hp: 1,
        attack: 1,
        ability: Ability::Mobility,
        glyph: "🪆".to_string(),
    }]);
    config
}

#[test]
fn deploy_then_run_out_of_gold() {
    let mut sim = quiet_simulation(1);
    assert_eq!(sim.gold(), 50);

    sim.deploy(archetypes::CONNIE).unwrap();
    assert_eq!(sim.gold(), 22);
    assert_eq!(sim.player_units().len(), 1);

    let err = sim.deploy(archetypes::CONNIE).unwrap_err();
    assert_eq!(
        err,
        GameError::InsufficientGold {
            required: 30,
            available: 22
        }
    );
    assert_eq!(sim.gold(), 22);
    assert_eq!(sim.player_units().len(), 1);
}

#[test]
fn deploy_rebate_includes_gold_bonus() {
    let mut sim = quiet_simulation(1);
    sim.set_gold(1000);
    for _ in 0..5 {
        sim.purchase_upgrade(UpgradeKind::GoldIncrease).unwrap();
    }
    let before = sim.gold();
    sim.deploy(archetypes::EREN).unwrap();
    // 24 cost, 2 rebate, floor(2 * 5 * 0.1) = 1 bonus
    assert_eq!(sim.gold(), before - 24 + 2 + 1);
}

#[test]
fn ten_breaches_lose_the_game() {
    let mut sim = quiet_simulation(1);
    for i in 0..10 {
        place_unit(&mut sim, archetypes::EREN, Team::Enemy, 1, 100 + i * 20);
    }

    let events = sim.tick();
    assert_eq!(events.breaches, 10);
    assert_eq!(events.player_damage, 100);
    assert_eq!(events.outcome, Some(GameStatus::Lost));
    assert_eq!(sim.player_hp(), 0);
    assert_eq!(sim.status(), GameStatus::Lost);

    let hash = sim.state_hash();
    let later = sim.tick();
    assert!(!later.processed);
    assert_eq!(sim.state_hash(), hash);
    assert!(matches!(
        sim.deploy(archetypes::EREN),
        Err(GameError::GameFinished(_))
    ));
}

#[test]
fn breach_damage_clamps_at_zero() {
    let mut sim = quiet_simulation(1);
    for i in 0..12 {
        place_unit(&mut sim, archetypes::EREN, Team::Enemy, 2, 100 + i * 15);
    }
    let events = sim.tick();
    assert_eq!(events.breaches, 12);
    assert_eq!(events.player_damage, 100);
    assert_eq!(sim.player_hp(), 0);
}

#[test]
fn collision_needs_distance_strictly_below_radius() {
    let mut sim = quiet_simulation(1);
    place_unit(&mut sim, archetypes::EREN, Team::Player, 100, 200);
    place_unit(&mut sim, archetypes::EREN, Team::Enemy, 156, 200);

    // 103 vs 153: exactly 50 apart.
    sim.tick();
    assert_eq!(sim.player_units()[0].hp, 100);
    assert_eq!(sim.enemy_units()[0].hp, 100);
    assert_eq!(sim.player_hp(), 100);

    // 106 vs 150: 44 apart.
    sim.tick();
    assert_eq!(sim.enemy_units()[0].hp, 75);
    assert_eq!(sim.player_units()[0].hp, 75);
    assert_eq!(sim.player_hp(), 98);
}

#[test]
fn unit_at_one_hp_dies_from_one_damage() {
    let mut sim = Simulation::with_config(one_hp_config(), 1).unwrap();
    place_unit(&mut sim, ArchetypeId(0), Team::Player, 300, 200);
    let enemy = place_unit(&mut sim, ArchetypeId(0), Team::Enemy, 320, 200);

    let events = sim.tick();
    assert_eq!(events.enemies_killed, vec![enemy]);
    assert!(sim.enemy_units().is_empty());
    assert_eq!(sim.player_units()[0].hp, 1);
}

#[test]
fn stalled_enemy_blocks_wave_advance() {
    let mut config = no_drift_config();
    config.combat.unit_speed = 0;
    let mut sim = Simulation::with_config(config, 9).unwrap();

    for _ in 0..3000 {
        sim.tick();
    }
    assert_eq!(sim.wave(), 1);
    assert_eq!(sim.wave_state().spawned, 3);
    assert_eq!(sim.enemy_units().len(), 3);
}

#[test]
fn wave_advances_only_once_cleared() {
    let mut config = no_drift_config();
    config.waves = vec![WaveDefinition::new(1, 100), WaveDefinition::new(2, 100)];
    let mut sim = Simulation::with_config(config, 3).unwrap();

    let mut saw_enemy = false;
    let ran = tick_until(&mut sim, 2000, |s| {
        saw_enemy |= !s.enemy_units().is_empty();
        s.wave() == 2
    });
    assert!(ran < 2000);
    assert!(saw_enemy);
    assert_eq!(sim.wave_state().spawned, 0);
    assert!(sim.enemy_units().is_empty());
    // The single enemy walked through.
    assert_eq!(sim.player_hp(), 90);
}

#[test]
fn wave_transition_clears_surviving_players() {
    let mut config = no_drift_config();
    config.waves = vec![WaveDefinition::new(1, 100), WaveDefinition::new(1, 100)];
    let mut sim = Simulation::with_config(config, 3).unwrap();

    // Off the lane and far behind the spawn edge, so it outlives wave 1.
    let survivor = place_unit(&mut sim, archetypes::EREN, Team::Player, -1000, -1000);

    let mut players_before = 0;
    let ran = tick_until(&mut sim, 2000, |s| {
        if s.wave() == 1 {
            players_before = s.player_units().len();
        }
        s.wave() == 2
    });
    assert!(ran < 2000);
    assert_eq!(players_before, 1);
    assert!(sim.player_units().iter().all(|u| u.id != survivor));
    assert!(sim.player_units().is_empty());
    assert!(sim.enemy_units().is_empty());
    assert_eq!(sim.wave_state().number, 2);
    assert_eq!(sim.wave_state().spawned, 0);
    assert_eq!(sim.wave_state().spawn_timer, 0);

    // The field is usable again straight away.
    sim.deploy(archetypes::EREN).unwrap();
    assert_eq!(sim.player_units().len(), 1);
}

#[test]
fn wide_playfield_collisions_do_not_overflow() {
    let mut config = no_drift_config();
    config.playfield.width = 100_000;
    let mut sim = Simulation::with_config(config, 8).unwrap();
    sim.deploy(archetypes::EREN).unwrap();

    tick_until(&mut sim, 500, |s| !s.enemy_units().is_empty());
    assert_eq!(sim.enemy_units().len(), 1);
    for _ in 0..60 {
        sim.tick();
    }
    assert_eq!(sim.player_units().len(), 1);
    assert_eq!(sim.enemy_units().len(), 1);
}

#[test]
fn oversized_playfield_is_rejected() {
    let mut config = no_drift_config();
    config.playfield.width = i32::MAX;
    assert!(matches!(
        Simulation::with_config(config, 1),
        Err(GameError::InvalidConfig(_))
    ));
}

#[test]
fn clearing_the_last_wave_wins() {
    let mut config = no_drift_config();
    config.waves = vec![WaveDefinition::new(1, 100)];
    let mut sim = Simulation::with_config(config, 3).unwrap();

    tick_until(&mut sim, 2000, |s| s.status().is_finished());
    assert_eq!(sim.status(), GameStatus::Won);
    assert_eq!(sim.wave(), 2);
    assert_eq!(sim.summary().waves_cleared, 1);
}

#[test]
fn character_level_affects_new_units_only() {
    let mut sim = quiet_simulation(1);
    sim.set_gold(1000);
    let old = place_unit(&mut sim, archetypes::EREN, Team::Player, 100, 200);
    sim.purchase_upgrade(UpgradeKind::CharacterLevel).unwrap();
    let new = place_unit(&mut sim, archetypes::EREN, Team::Player, 100, 250);

    let hp_of = |id| sim.player_units().iter().find(|u| u.id == id).unwrap().hp;
    assert_eq!(hp_of(old), 100);
    assert_eq!(hp_of(new), 120);
    // Attack is looked up live, so both hit for the new value.
    let attack = sim.player_units()[0].attack(sim.catalog()).unwrap();
    assert_eq!(attack, 30);
}

#[test]
fn replay_round_trip_through_file() {
    let mut recorder = Recorder::new(GameConfig::default(), 555).unwrap();
    for frame in 0..900 {
        if frame % 150 == 0 {
            let _ = recorder.apply(PlayerCommand::Deploy(archetypes::EREN));
        }
        recorder.tick();
    }
    let replay = recorder.finish();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.replay");
    replay.save(&path).unwrap();
    let loaded = Replay::load(&path).unwrap();
    assert!(ReplayPlayer::new(loaded).unwrap().verify().is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn player_hp_stays_within_bounds(
        seed in any::<u64>(),
        script in titan_test_utils::determinism::strategies::arb_script(40, 1500),
        gold in 0u32..2000,
    ) {
        let mut sim = Simulation::new(seed);
        sim.set_gold(gold);
        for tick in 0..1500u64 {
            for (_, command) in script.iter().filter(|(at, _)| *at == tick) {
                let _ = sim.apply(*command);
            }
            sim.tick();
            prop_assert!(sim.player_hp() <= sim.player_max_hp());
            for unit in sim.player_units().iter().chain(sim.enemy_units()) {
                prop_assert!(unit.hp > 0);
                prop_assert!(unit.hp <= unit.max_hp);
            }
        }
    }

    #[test]
    fn failed_deploys_change_nothing(gold in 0u32..24) {
        let mut sim = quiet_simulation(1);
        sim.set_gold(gold);
        let before = sim.state_hash();
        prop_assert!(sim.deploy(archetypes::EREN).is_err());
        prop_assert_eq!(sim.state_hash(), before);
    }
}
