//! Error types for the game simulation.

use thiserror::Error;

use crate::archetype::ArchetypeId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Archetype identifier outside the catalog.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(ArchetypeId),

    /// Archetype name that no catalog entry carries.
    #[error("Unknown archetype name: {0}")]
    UnknownArchetypeName(String),

    /// Not enough gold for a deploy or upgrade purchase.
    #[error("Insufficient gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold required.
        required: u32,
        /// Gold available.
        available: u32,
    },

    /// The game already ended; only `reset` is accepted.
    #[error("Game is over: {0}")]
    GameFinished(String),

    /// Data file parsing error.
    #[error("Failed to parse {what}: {message}")]
    DataParseError {
        /// What was being parsed (catalog, config, ...).
        what: String,
        /// Error message.
        message: String,
    },

    /// Configuration that parses but cannot drive a game.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Replay could not be encoded.
    #[error("Failed to encode replay: {0}")]
    ReplayEncode(String),

    /// Replay file could not be read or written.
    #[error("Replay I/O failed for {path}: {message}")]
    ReplayIo {
        /// File involved.
        path: String,
        /// Underlying I/O error.
        message: String,
    },

    /// Replay written by an incompatible format version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build reads.
        expected: u32,
        /// Version in the file.
        found: u32,
    },

    /// Replay did not reproduce the recorded result.
    #[error("Desync detected at frame {frame}: expected hash {expected}, got {actual}")]
    DesyncDetected {
        /// Frame where the mismatch was detected.
        frame: u64,
        /// Recorded hash.
        expected: u64,
        /// Hash produced on playback.
        actual: u64,
    },
}
