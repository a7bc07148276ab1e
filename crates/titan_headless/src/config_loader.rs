//! Game configuration loading for headless runs.
//!
//! The core only parses RON strings; reading files from disk happens here.
//! A config file holds a full [`GameConfig`]; an archetype file holds a
//! bare list of [`ArchetypeData`] and replaces the catalog of whatever
//! config it is combined with.

use std::fs;
use std::path::Path;

use thiserror::Error;
use titan_core::archetype::{ArchetypeData, Catalog};
use titan_core::config::GameConfig;
use titan_core::error::GameError;

/// Error type for config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read {path}: {source}")]
    ReadError {
        /// File that failed.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Parsed but rejected by the core.
    #[error("Invalid config in {path}: {source}")]
    Invalid {
        /// File that failed.
        path: String,
        /// Core error.
        source: GameError,
    },
}

fn read(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    })
}

/// Load and validate a game config from a RON file.
pub fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let contents = read(path)?;
    let config = GameConfig::from_ron_str(&contents).map_err(|source| ConfigError::Invalid {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        waves = config.total_waves(),
        custom_catalog = config.archetypes.is_some(),
        "Loaded game config"
    );
    Ok(config)
}

/// Load archetype definitions from a RON file.
pub fn load_archetypes(path: &Path) -> Result<Vec<ArchetypeData>, ConfigError> {
    let contents = read(path)?;
    let catalog = Catalog::from_ron_str(&contents).map_err(|source| ConfigError::Invalid {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), archetypes = catalog.len(), "Loaded archetypes");
    Ok(catalog.definitions())
}

/// Build the config for a run from optional config and archetype files.
///
/// Missing paths fall back to the stock values.
pub fn resolve_config(
    config_path: Option<&Path>,
    archetypes_path: Option<&Path>,
) -> Result<GameConfig, ConfigError> {
    let mut config = match config_path {
        Some(path) => load_game_config(path)?,
        None => GameConfig::default(),
    };
    if let Some(path) = archetypes_path {
        config.archetypes = Some(load_archetypes(path)?);
        config.validate().map_err(|source| ConfigError::Invalid {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(config)
}
