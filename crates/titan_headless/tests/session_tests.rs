//! End-to-end tests of the headless surfaces.
//!
//! Drives the JSON-lines protocol and the autopilot the way the binary
//! does, then checks the recorded replays play back identically.

use std::path::PathBuf;

use titan_core::replay::{Replay, ReplayPlayer};
use titan_core::simulation::GameStatus;
use titan_headless::game_runner::{run_game, RunConfig};
use titan_headless::protocol::Response;
use titan_headless::runner::{HeadlessConfig, HeadlessRunner};
use titan_headless::strategies::Strategy;

fn session(lines: &[&str]) -> (Vec<Response>, Replay) {
    let runner = HeadlessRunner::new(HeadlessConfig {
        seed: 2024,
        ..Default::default()
    })
    .unwrap();
    let mut output = Vec::new();
    let replay = runner.run(lines.join("\n").as_bytes(), &mut output).unwrap();
    let responses = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (responses, replay)
}

#[test]
fn catalog_lists_discounted_costs() {
    let (responses, _) = session(&[r#"{"cmd":"catalog"}"#]);
    let Response::Catalog { archetypes } = &responses[1] else {
        panic!("expected catalog, got {:?}", responses[1]);
    };
    assert_eq!(archetypes.len(), 10);
    assert_eq!(archetypes[0].name, "Eren");
    assert_eq!(archetypes[0].cost, 24);
    assert_eq!(archetypes[3].cost, 48);
    assert!(archetypes.iter().all(|a| a.level == 1));
}

#[test]
fn deploying_until_broke() {
    let (responses, _) = session(&[
        r#"{"cmd":"deploy","archetype":"Eren"}"#,
        r#"{"cmd":"deploy","archetype":0}"#,
        r#"{"cmd":"deploy","archetype":"eren"}"#,
        r#"{"cmd":"query"}"#,
    ]);
    assert!(matches!(responses[1], Response::Deployed { gold: 28, .. }));
    assert!(matches!(responses[2], Response::Deployed { gold: 6, .. }));
    assert!(matches!(&responses[3], Response::Error { cmd: Some(cmd), .. } if cmd == "deploy"));
    let Response::State { state, .. } = &responses[4] else {
        panic!("expected state, got {:?}", responses[4]);
    };
    assert_eq!(state.gold, 6);
    assert_eq!(state.units.len(), 2);
}

#[test]
fn unknown_archetype_is_rejected() {
    let (responses, replay) = session(&[
        r#"{"cmd":"deploy","archetype":"Reiner"}"#,
        r#"{"cmd":"deploy","archetype":42}"#,
    ]);
    assert!(matches!(responses[1], Response::Error { .. }));
    assert!(matches!(responses[2], Response::Error { .. }));
    // Nothing reached the simulation, so nothing was recorded.
    assert_eq!(replay.command_count(), 0);
}

#[test]
fn hash_matches_replayed_session() {
    let (responses, replay) = session(&[
        r#"{"cmd":"difficulty","level":"easy"}"#,
        r#"{"cmd":"deploy","archetype":"Mikasa"}"#,
        r#"{"cmd":"tick","count":400}"#,
        r#"{"cmd":"deploy","archetype":"Connie"}"#,
        r#"{"cmd":"tick","count":400}"#,
        r#"{"cmd":"hash"}"#,
    ]);
    let Some(Response::StateHash { hash, .. }) = responses.last() else {
        panic!("expected state hash, got {:?}", responses.last());
    };
    let sim = ReplayPlayer::new(replay).unwrap().verify().unwrap();
    assert_eq!(sim.state_hash(), *hash);
}

#[test]
fn bundled_strategies_play_verifiable_games() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("strategies");
    for name in ["balanced", "swarm", "elite"] {
        let strategy = Strategy::load(dir.join(format!("{name}.ron"))).unwrap();
        let result = run_game(RunConfig {
            max_ticks: 2500,
            strategy,
            ..RunConfig::with_seed(31)
        })
        .unwrap();

        assert!(result.metrics.units_deployed() > 0, "{name} never deployed");
        let sim = ReplayPlayer::new(result.replay).unwrap().verify().unwrap();
        assert_eq!(sim.state_hash(), result.final_state_hash, "{name}");
    }
}

#[test]
fn autopilot_games_end_or_hit_the_limit() {
    let result = run_game(RunConfig {
        max_ticks: 20_000,
        strategy: Strategy::swarm(),
        ..RunConfig::with_seed(5)
    })
    .unwrap();
    match result.summary.status {
        GameStatus::InProgress => assert_eq!(result.summary.tick, 20_000),
        GameStatus::Won => assert_eq!(result.summary.waves_cleared, 10),
        GameStatus::Lost => assert_eq!(result.summary.player_hp, 0),
    }
}
