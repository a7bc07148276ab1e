//! # Titan Core
//!
//! Deterministic game core for Titan Defense, a single-lane defense game.
//! The player deploys units from the left edge; enemy waves walk in from
//! the right. Every rule of a match lives here:
//!
//! - No rendering
//! - No IO apart from replay files
//! - No system randomness (one seeded stream per game)
//! - No floating-point math in the rules (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs and automated balance tuning
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`archetype`] - Archetype definitions, levels and the catalog
//! - [`unit`] - Units on the field
//! - [`wave`] - Wave table and spawn pacing
//! - [`economy`] - Gold stockpile and bonus math
//! - [`upgrades`] - Purchasable upgrades
//! - [`config`] - Tunable constants
//! - [`simulation`] - Core simulation loop
//! - [`command`] - Player commands
//! - [`snapshot`] - Read-only views for front ends
//! - [`replay`] - Replay recording and playback
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod command;
pub mod config;
pub mod economy;
pub mod error;
pub mod math;
pub mod replay;
pub mod simulation;
pub mod snapshot;
pub mod unit;
pub mod upgrades;
pub mod wave;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetype::{Ability, Archetype, ArchetypeData, ArchetypeId, Catalog, Stats};
    pub use crate::command::{CommandOutcome, PlayerCommand};
    pub use crate::config::GameConfig;
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::replay::{Recorder, Replay, ReplayPlayer};
    pub use crate::simulation::{Difficulty, GameStatus, Simulation, TickEvents, UnitSpawnParams};
    pub use crate::snapshot::{GameSummary, Snapshot, UnitView};
    pub use crate::unit::{HealthBand, Team, Unit, UnitId};
    pub use crate::upgrades::{UpgradeCounts, UpgradeKind};
    pub use crate::wave::{WaveDefinition, WaveState};
}
