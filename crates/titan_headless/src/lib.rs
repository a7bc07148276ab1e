//! Headless game runner for scripted play, balance runs and CI verification.
//!
//! This crate runs the lane-defense game without graphics. It can be
//! driven two ways:
//!
//! - **Protocol**: JSON commands on stdin, JSON responses on stdout. An
//!   external agent plays the game one command at a time.
//! - **Autopilot**: a [`Strategy`] plays whole games; [`batch`] runs many
//!   of them in parallel and aggregates [`GameMetrics`].
//!
//! Every session records a replay that can be verified later.
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, deploy, upgrade, etc.)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p titan_headless
//!
//! # Balance run
//! cargo run -p titan_headless -- batch --strategy swarm --count 200
//!
//! # Verify a replay
//! cargo run -p titan_headless -- replay --file game.replay --verify
//! ```

pub mod batch;
pub mod config_loader;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod strategies;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use config_loader::{resolve_config, ConfigError};
pub use game_runner::{run_game, GameResult, RunConfig};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use strategies::{Strategy, StrategyExecutor};
