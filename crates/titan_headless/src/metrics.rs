//! Game metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] folds the per-tick events and the commands a
//! strategy issued into one [`GameMetrics`] record; [`BatchSummary`]
//! aggregates many of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use titan_core::simulation::{GameStatus, Simulation, TickEvents};
use titan_core::upgrades::UpgradeCounts;

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Strategy that played the game.
    pub strategy: String,
    /// Random seed used.
    pub seed: u64,
    /// Total game duration in ticks.
    pub duration_ticks: u64,
    /// How the game ended. `None` if it hit the tick limit.
    pub outcome: Option<GameStatus>,
    /// Waves fully cleared.
    pub waves_cleared: u32,
    /// Gold on hand at the end.
    pub final_gold: u32,
    /// Player hit points at the end.
    pub final_player_hp: u32,

    // === Economy ===
    /// Gold credited over the game.
    pub gold_earned: u64,
    /// Gold spent over the game.
    pub gold_spent: u64,
    /// Upgrades bought.
    pub upgrades: UpgradeCounts,

    // === Units ===
    /// Player units deployed, by archetype name.
    pub deploys_by_archetype: BTreeMap<String, u32>,
    /// Player units killed in collisions.
    pub units_lost: u32,
    /// Player units that walked off the right edge.
    pub units_exited: u32,
    /// Enemies spawned by waves.
    pub enemies_spawned: u32,
    /// Enemies killed.
    pub enemies_killed: u32,
    /// Enemies that crossed the left edge.
    pub breaches: u32,
    /// Player hit points lost to breaches.
    pub damage_taken: u32,
    /// Tick each wave started on.
    pub wave_start_ticks: Vec<u64>,
    /// Commands the simulation rejected.
    pub rejected_commands: u32,

    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create an empty metrics record.
    #[must_use]
    pub fn new(game_id: impl Into<String>, strategy: impl Into<String>, seed: u64) -> Self {
        Self {
            game_id: game_id.into(),
            strategy: strategy.into(),
            seed,
            ..Default::default()
        }
    }

    /// Total player units deployed.
    #[must_use]
    pub fn units_deployed(&self) -> u32 {
        self.deploys_by_archetype.values().sum()
    }

    /// Whether the player won.
    #[must_use]
    pub fn won(&self) -> bool {
        self.outcome == Some(GameStatus::Won)
    }
}

/// Accumulates metrics while a game runs.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: GameMetrics,
}

impl MetricsCollector {
    /// Start collecting for a game.
    #[must_use]
    pub fn new(game_id: impl Into<String>, strategy: impl Into<String>, seed: u64) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, strategy, seed),
        }
    }

    /// Fold in one tick's events. `tick` is the tick just processed.
    pub fn record_tick(&mut self, tick: u64, events: &TickEvents) {
        if !events.processed {
            return;
        }
        let m = &mut self.metrics;
        m.enemies_spawned += events.spawned.len() as u32;
        m.enemies_killed += events.enemies_killed.len() as u32;
        m.units_lost += events.units_lost.len() as u32;
        m.units_exited += events.units_exited.len() as u32;
        m.breaches += events.breaches;
        m.damage_taken += events.player_damage;
        if events.wave_started.is_some() {
            m.wave_start_ticks.push(tick);
        }
    }

    /// Record a successful deploy.
    pub fn record_deploy(&mut self, archetype_name: &str) {
        *self
            .metrics
            .deploys_by_archetype
            .entry(archetype_name.to_string())
            .or_default() += 1;
    }

    /// Record a command the simulation refused.
    pub fn record_rejected(&mut self) {
        self.metrics.rejected_commands += 1;
    }

    /// Metrics so far.
    #[must_use]
    pub const fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Stamp the end state and hand back the record.
    #[must_use]
    pub fn finish(mut self, sim: &Simulation) -> GameMetrics {
        let summary = sim.summary();
        let m = &mut self.metrics;
        m.duration_ticks = summary.tick;
        m.outcome = summary.status.is_finished().then_some(summary.status);
        m.waves_cleared = summary.waves_cleared;
        m.final_gold = summary.gold;
        m.final_player_hp = summary.player_hp;
        m.gold_earned = summary.gold_earned;
        m.gold_spent = summary.gold_spent;
        m.upgrades = summary.upgrades;
        m.final_state_hash = sim.state_hash();
        self.metrics
    }
}

/// Summary statistics across multiple games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games played.
    pub total_games: u32,
    /// Games won.
    pub wins: u32,
    /// Games lost.
    pub losses: u32,
    /// Games cut off by the tick limit.
    pub timeouts: u32,
    /// Wins over total games.
    pub win_rate: f64,
    /// Average game duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest game.
    pub min_duration_ticks: u64,
    /// Longest game.
    pub max_duration_ticks: u64,
    /// Average waves cleared.
    pub avg_waves_cleared: f64,
    /// Games that reached each wave count, indexed by waves cleared.
    pub waves_cleared_histogram: Vec<u32>,
    /// Average gold earned.
    pub avg_gold_earned: f64,
    /// Average player units deployed.
    pub avg_units_deployed: f64,
    /// Average enemies killed.
    pub avg_enemies_killed: f64,
    /// Average breaches.
    pub avg_breaches: f64,
    /// Deploys per game by archetype.
    pub avg_deploys_by_archetype: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let count = games.len() as f64;
        let average = |f: &dyn Fn(&GameMetrics) -> f64| games.iter().map(f).sum::<f64>() / count;

        let mut summary = Self {
            total_games: games.len() as u32,
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut deploys: BTreeMap<String, u32> = BTreeMap::new();
        for game in games {
            match game.outcome {
                Some(GameStatus::Won) => summary.wins += 1,
                Some(GameStatus::Lost) => summary.losses += 1,
                _ => summary.timeouts += 1,
            }
            summary.min_duration_ticks = summary.min_duration_ticks.min(game.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(game.duration_ticks);

            let slot = game.waves_cleared as usize;
            if summary.waves_cleared_histogram.len() <= slot {
                summary.waves_cleared_histogram.resize(slot + 1, 0);
            }
            summary.waves_cleared_histogram[slot] += 1;

            for (name, n) in &game.deploys_by_archetype {
                *deploys.entry(name.clone()).or_default() += n;
            }
        }

        summary.win_rate = f64::from(summary.wins) / count;
        summary.avg_duration_ticks = average(&|g| g.duration_ticks as f64);
        summary.avg_waves_cleared = average(&|g| f64::from(g.waves_cleared));
        summary.avg_gold_earned = average(&|g| g.gold_earned as f64);
        summary.avg_units_deployed = average(&|g| f64::from(g.units_deployed()));
        summary.avg_enemies_killed = average(&|g| f64::from(g.enemies_killed));
        summary.avg_breaches = average(&|g| f64::from(g.breaches));
        summary.avg_deploys_by_archetype = deploys
            .into_iter()
            .map(|(name, n)| (name, f64::from(n) / count))
            .collect();

        summary
    }

    /// The archetype deployed most often, if any.
    #[must_use]
    pub fn favorite_archetype(&self) -> Option<&str> {
        self.avg_deploys_by_archetype
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, _)| name.as_str())
    }
}
