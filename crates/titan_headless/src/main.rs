//! Headless lane-defense game runner.
//!
//! This binary runs the game without graphics, controlled via JSON on
//! stdin/stdout or by a scripted strategy.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p titan_headless
//!
//! # Interactive with custom rules, saving the session replay
//! cargo run -p titan_headless -- run --config rules.ron --record session.replay
//!
//! # One autopilot game
//! cargo run -p titan_headless -- play --strategy elite --seed 7
//!
//! # Batch balance test
//! cargo run -p titan_headless -- batch --strategy balanced --count 1000 --output results/
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use titan_core::replay::{Replay, ReplayPlayer};
use titan_core::simulation::Simulation;
use titan_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    config_loader::resolve_config,
    game_runner::{run_game, RunConfig, DEFAULT_MAX_TICKS},
    runner::{HeadlessConfig, HeadlessRunner},
    strategies::Strategy,
};

#[derive(Parser)]
#[command(name = "titan_headless")]
#[command(about = "Headless lane-defense runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game driven by JSON commands on stdin
    Run {
        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Game rules file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Archetype roster file (RON)
        #[arg(short, long)]
        archetypes: Option<PathBuf>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,

        /// Save the session replay here on exit
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Play one game with a scripted strategy and print its summary
    Play {
        /// Built-in strategy name or RON file
        #[arg(short, long, default_value = "balanced")]
        strategy: String,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Game rules file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Archetype roster file (RON)
        #[arg(short, long)]
        archetypes: Option<PathBuf>,

        /// Save the game's replay here
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },

    /// Run batch of games for balance testing
    Batch {
        /// Built-in strategy name or RON file
        #[arg(short, long, default_value = "balanced")]
        strategy: String,

        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per game
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Game rules file (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Archetype roster file (RON)
        #[arg(short, long)]
        archetypes: Option<PathBuf>,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Built-in strategy name or RON file
        #[arg(short, long, default_value = "balanced")]
        strategy: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Also save one run's replay here
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },

    /// Replay a recorded game
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// Run N ticks on a crowded field for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            seed,
            config,
            archetypes,
            auto_state,
            record,
        }) => cmd_run(seed, config, archetypes, auto_state, record),
        Some(Commands::Play {
            strategy,
            seed,
            max_ticks,
            config,
            archetypes,
            save_replay,
        }) => cmd_play(&strategy, seed, max_ticks, config, archetypes, save_replay),
        Some(Commands::Batch {
            strategy,
            count,
            parallel,
            output,
            seed,
            max_ticks,
            config,
            archetypes,
        }) => {
            let config = BatchConfig {
                strategy,
                game_count: count,
                parallel_games: parallel,
                output_dir: output,
                seed_start: seed,
                max_ticks,
                config_path: config,
                archetypes_path: archetypes,
            };
            cmd_batch(config);
        }
        Some(Commands::Verify {
            strategy,
            seed,
            runs,
            max_ticks,
            save_replay,
        }) => cmd_verify(strategy, seed, runs, max_ticks, save_replay),
        Some(Commands::Replay { file, verify }) => cmd_replay(&file, verify),
        Some(Commands::Benchmark { ticks, seed }) => cmd_benchmark(ticks, seed),
        None => {
            // Default: interactive mode
            cmd_run(0, None, None, false, None);
        }
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    tracing::error!(error = %error, "{}", context);
    eprintln!("FATAL: {context}: {error}");
    std::process::exit(1);
}

/// Run a single interactive game
fn cmd_run(
    seed: u64,
    config: Option<PathBuf>,
    archetypes: Option<PathBuf>,
    auto_state: bool,
    record: Option<PathBuf>,
) {
    let game_config = resolve_config(config.as_deref(), archetypes.as_deref())
        .unwrap_or_else(|e| fail("Failed to load game rules", e));

    tracing::info!(seed, "Starting interactive session");

    let runner = HeadlessRunner::new(HeadlessConfig {
        auto_state_output: auto_state,
        seed,
        game_config,
    })
    .unwrap_or_else(|e| fail("Invalid game rules", e));

    let replay = runner
        .run_stdio()
        .unwrap_or_else(|e| fail("Session I/O failed", e));

    if let Some(path) = record {
        save_replay(&replay, &path);
    }
}

/// Play one autopilot game
fn cmd_play(
    strategy: &str,
    seed: u64,
    max_ticks: u64,
    config: Option<PathBuf>,
    archetypes: Option<PathBuf>,
    replay_path: Option<PathBuf>,
) {
    let strategy = Strategy::resolve(strategy).unwrap_or_else(|e| fail("Bad strategy", e));
    let game_config = resolve_config(config.as_deref(), archetypes.as_deref())
        .unwrap_or_else(|e| fail("Failed to load game rules", e));

    let result = run_game(RunConfig {
        seed,
        max_ticks,
        strategy,
        game_config,
        game_id: format!("game_{seed}"),
    })
    .unwrap_or_else(|e| fail("Game failed", e));

    match serde_json::to_string_pretty(&result.metrics) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("Failed to encode metrics", e),
    }
    if let Some(path) = replay_path {
        save_replay(&result.replay, &path);
    }
}

/// Run batch of games for balance testing
fn cmd_batch(config: BatchConfig) {
    let batch_start = Instant::now();
    let output = config.output_dir.clone();

    tracing::info!(
        strategy = %config.strategy,
        count = config.game_count,
        parallel = config.parallel_games,
        seed = config.seed_start,
        max_ticks = config.max_ticks,
        output = %output.display(),
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        fail(&format!("Cannot create output directory '{}'", output.display()), e);
    }

    let results = run_batch(config);

    tracing::info!(
        games_completed = results.games.len(),
        games_failed = results.errors.len(),
        total_duration_secs = format!("{:.1}", batch_start.elapsed().as_secs_f64()),
        "Batch execution finished"
    );

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fail("Failed to save results", e);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games failed: {}", results.errors.len());
    }
    eprintln!(
        "Won / lost / timed out: {} / {} / {}",
        summary.wins, summary.losses, summary.timeouts
    );
    eprintln!("Win rate: {:.1}%", summary.win_rate * 100.0);
    eprintln!("Avg waves cleared: {:.2}", summary.avg_waves_cleared);
    eprintln!("Avg duration: {:.0} ticks", summary.avg_duration_ticks);
    if let Some(name) = summary.favorite_archetype() {
        eprintln!("Most deployed: {name}");
    }
    eprintln!("Results: {}", results_path.display());
}

/// Verify determinism by running the same seed several times
fn cmd_verify(strategy: String, seed: u64, runs: u32, max_ticks: u64, replay_path: Option<PathBuf>) {
    tracing::info!(
        "Verifying determinism: '{}' with seed {} ({} runs)",
        strategy,
        seed,
        runs
    );

    let config = BatchConfig::new(&strategy, 1).with_max_ticks(max_ticks);
    match verify_determinism(&config, seed, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => fail("Verification could not run", e),
    }

    if let Some(path) = replay_path {
        let strategy = Strategy::resolve(&strategy).unwrap_or_else(|e| fail("Bad strategy", e));
        let result = run_game(RunConfig {
            seed,
            max_ticks,
            strategy,
            ..RunConfig::with_seed(seed)
        })
        .unwrap_or_else(|e| fail("Game failed", e));
        save_replay(&result.replay, &path);
    }
}

/// Replay a recorded game
fn cmd_replay(file: &Path, verify: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = Replay::load(file).unwrap_or_else(|e| fail("Failed to load replay", e));

    eprintln!("Loaded replay:");
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Commands: {}", replay.command_count());
    eprintln!("  Duration: {} frames", replay.final_frame);

    let expected = replay.final_hash;
    let mut player =
        ReplayPlayer::new(replay).unwrap_or_else(|e| fail("Failed to create replay player", e));

    if verify {
        eprintln!("Verifying replay...");
        match player.verify() {
            Ok(sim) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Expected hash: {expected:016x}");
                eprintln!("  Actual hash:   {:016x}", sim.state_hash());
            }
            Err(e) => {
                eprintln!("FAIL: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let total = player.replay().final_frame;
    let mut last_percent = 0;
    while player.advance() {
        let percent = player.current_frame() * 100 / total.max(1);
        if percent > last_percent && percent % 10 == 0 {
            eprintln!("Progress: {percent}%");
            last_percent = percent;
        }
    }
    player.run_to_end();

    let summary = player.simulation().summary();
    eprintln!("Replay complete at frame {}", player.current_frame());
    eprintln!("Final state hash: {:016x}", player.simulation().state_hash());
    eprintln!("\nFinal State:");
    eprintln!("  Status: {:?}", summary.status);
    eprintln!("  Waves cleared: {}/{}", summary.waves_cleared, summary.total_waves);
    eprintln!("  Player hp: {}/{}", summary.player_hp, summary.player_max_hp);
    eprintln!("  Gold: {}", summary.gold);
}

/// Run benchmark
fn cmd_benchmark(ticks: u64, seed: u64) {
    tracing::info!("Running {} tick benchmark", ticks);

    let mut sim = Simulation::new(seed);
    sim.set_gold(u32::MAX / 2);
    let cheapest = sim
        .catalog()
        .iter()
        .min_by_key(|(_, archetype)| archetype.stats().cost)
        .map(|(id, _)| id)
        .unwrap_or_else(|| fail("Benchmark setup", "empty catalog"));

    // Warmup
    for _ in 0..100 {
        sim.tick();
    }

    eprintln!("Running {ticks} ticks, deploying every 5th tick...");
    let start = Instant::now();
    let mut peak_units = 0;
    for tick in 0..ticks {
        if tick % 5 == 0 && !sim.status().is_finished() {
            let _ = sim.deploy(cheapest);
        }
        sim.tick();
        peak_units = peak_units.max(sim.player_units().len() + sim.enemy_units().len());
    }
    let elapsed = start.elapsed();

    let tps = ticks as f64 / elapsed.as_secs_f64();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {ticks}");
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {tps:.1}");
    eprintln!("ms/tick: {:.4}", elapsed.as_millis() as f64 / ticks.max(1) as f64);
    eprintln!("Peak units: {peak_units}");
    eprintln!("Final status: {:?}", sim.status());
    eprintln!("State hash: {:016x}", sim.state_hash());
}

fn save_replay(replay: &Replay, path: &Path) {
    match replay.save(path) {
        Ok(()) => tracing::info!(
            path = %path.display(),
            frames = replay.final_frame,
            commands = replay.command_count(),
            "Replay saved"
        ),
        Err(e) => fail("Failed to save replay", e),
    }
}
