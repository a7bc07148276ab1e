//! Autopilot game execution for headless testing.
//!
//! Runs a full game with a [`Strategy`] playing the player side, records
//! every command into a replay and collects [`GameMetrics`].
//!
//! The loop is bounded by `max_ticks`; slow ticks are logged so a hang
//! shows up in the logs instead of stalling a batch silently.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use titan_core::command::CommandOutcome;
use titan_core::config::GameConfig;
use titan_core::error::Result;
use titan_core::replay::{Recorder, Replay};
use titan_core::simulation::Simulation;
use titan_core::snapshot::GameSummary;
use titan_core::unit::UnitId;

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::strategies::{Strategy, StrategyExecutor};

/// Ticks between progress log lines.
const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Ticks slower than this are logged as warnings.
const SLOW_TICK_THRESHOLD_MS: u128 = 100;

/// Default tick limit: ten minutes at 60 ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 36_000;

/// Configuration for a single game run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Random seed for the simulation and the autopilot.
    pub seed: u64,
    /// Maximum ticks before the game is cut off.
    pub max_ticks: u64,
    /// Strategy playing the player side.
    pub strategy: Strategy,
    /// Game rules.
    pub game_config: GameConfig,
    /// Game ID for tracking.
    pub game_id: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            strategy: Strategy::default(),
            game_config: GameConfig::default(),
            game_id: "game_0".to_string(),
        }
    }
}

impl RunConfig {
    /// Stock rules and strategy with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            game_id: format!("game_{seed}"),
            ..Default::default()
        }
    }
}

/// Result of running a game.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// State hash after the last tick.
    pub final_state_hash: u64,
    /// End-of-game report.
    pub summary: GameSummary,
    /// Recording of every command issued.
    pub replay: Replay,
}

/// Run one game to completion or to the tick limit.
///
/// Fails only if the game configuration is invalid.
pub fn run_game(config: RunConfig) -> Result<GameResult> {
    let game_start = Instant::now();
    info!(
        game_id = %config.game_id,
        seed = config.seed,
        max_ticks = config.max_ticks,
        strategy = %config.strategy.name,
        "Starting game simulation"
    );

    let mut recorder = Recorder::new(config.game_config, config.seed)?;
    let mut executor = StrategyExecutor::new(config.strategy, config.seed);
    let mut collector =
        MetricsCollector::new(&config.game_id, &executor.strategy().name, config.seed);
    let mut last_progress_log = Instant::now();

    while recorder.frame() < config.max_ticks && !recorder.simulation().status().is_finished() {
        for command in executor.next_commands(recorder.simulation()) {
            match recorder.apply(command) {
                Ok(CommandOutcome::Deployed(id)) => {
                    let name = deployed_name(recorder.simulation(), id);
                    collector.record_deploy(&name);
                }
                Ok(_) => {}
                Err(err) => {
                    trace!(?command, error = %err, "Autopilot command rejected");
                    collector.record_rejected();
                }
            }
        }

        let tick_start = Instant::now();
        let events = recorder.tick();
        let tick_duration = tick_start.elapsed();
        let tick = recorder.simulation().get_tick();
        collector.record_tick(tick, &events);

        if tick_duration.as_millis() > SLOW_TICK_THRESHOLD_MS {
            warn!(
                tick,
                duration_ms = tick_duration.as_millis(),
                threshold_ms = SLOW_TICK_THRESHOLD_MS,
                units = recorder.simulation().player_units().len()
                    + recorder.simulation().enemy_units().len(),
                "Slow tick detected"
            );
        }

        if tick % PROGRESS_LOG_INTERVAL == 0 || last_progress_log.elapsed() > Duration::from_secs(5)
        {
            let sim = recorder.simulation();
            debug!(
                tick,
                max_ticks = config.max_ticks,
                wave = sim.wave(),
                gold = sim.gold(),
                player_hp = sim.player_hp(),
                elapsed_ms = game_start.elapsed().as_millis(),
                "Game progress"
            );
            last_progress_log = Instant::now();
        }
    }

    let summary = recorder.simulation().summary();
    let metrics = collector.finish(recorder.simulation());
    let final_state_hash = metrics.final_state_hash;
    let replay = recorder.finish();

    info!(
        game_id = %metrics.game_id,
        outcome = ?summary.status,
        ticks = summary.tick,
        waves_cleared = summary.waves_cleared,
        elapsed_ms = game_start.elapsed().as_millis(),
        "Game finished"
    );

    Ok(GameResult {
        metrics,
        final_state_hash,
        summary,
        replay,
    })
}

fn deployed_name(sim: &Simulation, id: UnitId) -> String {
    sim.player_units()
        .iter()
        .find(|unit| unit.id == id)
        .and_then(|unit| sim.catalog().get(unit.archetype).ok())
        .map_or_else(|| String::from("unknown"), |a| a.data.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_core::replay::ReplayPlayer;
    use titan_core::simulation::GameStatus;

    fn short_run(seed: u64, strategy: Strategy) -> RunConfig {
        RunConfig {
            max_ticks: 3000,
            strategy,
            ..RunConfig::with_seed(seed)
        }
    }

    #[test]
    fn test_run_game_is_deterministic() {
        let a = run_game(short_run(11, Strategy::balanced())).unwrap();
        let b = run_game(short_run(11, Strategy::balanced())).unwrap();
        assert_eq!(a.final_state_hash, b.final_state_hash);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_run_game_respects_tick_limit() {
        let result = run_game(short_run(3, Strategy::swarm())).unwrap();
        assert!(result.summary.tick <= 3000);
        assert!(result.replay.final_frame <= 3000);
        if result.summary.status == GameStatus::InProgress {
            assert_eq!(result.metrics.outcome, None);
            assert_eq!(result.replay.final_frame, 3000);
        }
    }

    #[test]
    fn test_run_game_deploys_and_records() {
        let result = run_game(short_run(5, Strategy::swarm())).unwrap();
        assert!(result.metrics.units_deployed() > 0);
        assert!(result.metrics.deploys_by_archetype.contains_key("Eren"));
        assert!(result.replay.command_count() > 0);
        assert!(result.metrics.enemies_spawned > 0);
    }

    #[test]
    fn test_run_game_replay_verifies() {
        let result = run_game(short_run(8, Strategy::economist())).unwrap();
        let sim = ReplayPlayer::new(result.replay).unwrap().verify().unwrap();
        assert_eq!(sim.state_hash(), result.final_state_hash);
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = short_run(1, Strategy::balanced());
        config.game_config.waves.clear();
        assert!(run_game(config).is_err());
    }
}
