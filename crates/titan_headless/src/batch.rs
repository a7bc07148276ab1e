//! Batch game runner for balance testing.
//!
//! Runs many autopilot games in parallel using rayon and aggregates their
//! metrics.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use titan_core::config::GameConfig;

use crate::config_loader::resolve_config;
use crate::game_runner::{run_game, RunConfig, DEFAULT_MAX_TICKS};
use crate::metrics::{BatchSummary, GameMetrics};
use crate::strategies::Strategy;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Strategy name or RON path
    pub strategy: String,
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
    /// Maximum ticks per game
    pub max_ticks: u64,
    /// Game rules file (RON), stock rules if unset
    pub config_path: Option<PathBuf>,
    /// Archetype roster file (RON), overrides the rules file's roster
    pub archetypes_path: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strategy: "balanced".to_string(),
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            config_path: None,
            archetypes_path: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a strategy
    pub fn new(strategy: &str, game_count: u32) -> Self {
        Self {
            strategy: strategy.to_string(),
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set tick limit
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Set game rules files
    pub fn with_rules(mut self, config: Option<PathBuf>, archetypes: Option<PathBuf>) -> Self {
        self.config_path = config;
        self.archetypes_path = archetypes;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index (`u32::MAX` for batch setup)
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total games
    pub total: u32,
    /// Completed games
    pub completed: AtomicU32,
    /// Games won so far
    pub wins: AtomicU32,
    /// Start time
    pub start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            wins: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed game
    pub fn record_completion(&self, won: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if won {
            self.wins.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        self.current() as f64 / self.total.max(1) as f64 * 100.0
    }

    /// Win rate over completed games
    pub fn current_win_rate(&self) -> f64 {
        let completed = self.current();
        if completed == 0 {
            return 0.0;
        }
        self.wins.load(Ordering::Relaxed) as f64 / completed as f64
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_game = elapsed.as_secs_f64() / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * remaining as f64)
    }

    /// Display progress to stderr
    pub fn display(&self) {
        let eta = self.eta();
        eprintln!("╔════════════════════════════════════╗");
        eprintln!(
            "║ Batch Progress: {:>4}/{:<4} ({:>5.1}%) ║",
            self.current(),
            self.total,
            self.percentage()
        );
        eprintln!(
            "║ ETA: {:>28} ║",
            format!("{}m {}s", eta.as_secs() / 60, eta.as_secs() % 60)
        );
        eprintln!(
            "║ Win rate so far: {:>16.1}% ║",
            self.current_win_rate() * 100.0
        );
        eprintln!("╚════════════════════════════════════╝");
    }
}

/// Everything shared by the games of one batch.
#[derive(Debug, Clone)]
struct BatchSetup {
    strategy: Strategy,
    game_config: GameConfig,
}

impl BatchSetup {
    fn resolve(config: &BatchConfig) -> Result<Self, String> {
        let strategy = Strategy::resolve(&config.strategy).map_err(|e| e.to_string())?;
        let game_config = resolve_config(config.config_path.as_deref(), config.archetypes_path.as_deref())
            .map_err(|e| e.to_string())?;
        Ok(Self {
            strategy,
            game_config,
        })
    }

    fn run_config(&self, seed: u64, max_ticks: u64) -> RunConfig {
        RunConfig {
            seed,
            max_ticks,
            strategy: self.strategy.clone(),
            game_config: self.game_config.clone(),
            game_id: format!("game_{seed}"),
        }
    }
}

fn run_single_game(setup: &BatchSetup, seed: u64, max_ticks: u64) -> Result<GameMetrics, String> {
    run_game(setup.run_config(seed, max_ticks))
        .map(|result| result.metrics)
        .map_err(|e| e.to_string())
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch run: {} games with strategy '{}'",
        config.game_count, config.strategy
    );

    let setup = match BatchSetup::resolve(&config) {
        Ok(setup) => setup,
        Err(message) => {
            warn!("Batch setup failed: {}", message);
            return BatchResults {
                config,
                games: Vec::new(),
                summary: BatchSummary::default(),
                duration_seconds: start.elapsed().as_secs_f64(),
                errors: vec![BatchError {
                    game_index: u32::MAX,
                    seed: 0,
                    message,
                }],
            };
        }
    };

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let progress = Arc::new(BatchProgress::new(config.game_count));
    let results: Vec<Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_single_game(&setup, seed, config.max_ticks) {
                Ok(metrics) => {
                    progress.record_completion(metrics.won());
                    let completed = progress.current();
                    if completed % 10 == 0 {
                        debug!("Progress: {}/{}", completed, config.game_count);
                    }
                    if completed % 100 == 0 {
                        progress.display();
                    }
                    Ok(metrics)
                }
                Err(message) => {
                    warn!("Game {} failed: {}", i, message);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message,
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec), win rate {:.1}%",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON),
        summary.win_rate * 100.0
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed `runs` times and check every run ends identically.
pub fn verify_determinism(config: &BatchConfig, seed: u64, runs: u32) -> Result<bool, String> {
    let setup = BatchSetup::resolve(config)?;
    let results = (0..runs.max(1))
        .map(|_| run_single_game(&setup, seed, config.max_ticks))
        .collect::<Result<Vec<_>, _>>()?;

    let first = &results[0];
    let consistent = results.iter().all(|r| {
        r.final_state_hash == first.final_state_hash
            && r.duration_ticks == first.duration_ticks
            && r.outcome == first.outcome
    });
    if !consistent {
        warn!(seed, runs, "Runs of the same seed diverged");
    }
    Ok(consistent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(games: u32) -> BatchConfig {
        BatchConfig::new("swarm", games).with_max_ticks(1500)
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 100);
        assert_eq!(config.strategy, "balanced");
        assert_eq!(config.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("elite", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345);

        assert_eq!(config.strategy, "elite");
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(100);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.percentage(), 0.0);

        progress.record_completion(true);
        progress.record_completion(false);
        progress.record_completion(true);

        assert_eq!(progress.current(), 3);
        assert!((progress.current_win_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(small(6));
        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        for seed in 0..6 {
            assert!(seeds.contains(&seed));
        }
    }

    #[test]
    fn test_unknown_strategy_is_reported() {
        let results = run_batch(BatchConfig::new("turtle", 3));
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 1);
        assert!(results.errors[0].message.contains("turtle"));
    }

    #[test]
    fn test_verify_determinism() {
        assert_eq!(verify_determinism(&small(1), 12345, 3), Ok(true));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(small(3));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config, results.config);
    }
}
