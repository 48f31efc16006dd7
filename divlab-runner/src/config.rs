//! Backtest manifest: the simulation parameters plus the games to run.
//!
//! ```toml
//! [simulation]
//! entry_threshold = 0.05
//! exit_threshold = 0.01
//!
//! [[games]]
//! id = "2024-03-01-bos-nyk"
//! game_start = "2024-03-01T19:00:00Z"
//! series_a = "data/bos-nyk/model.csv"
//! series_b = "data/bos-nyk/market.csv"
//! ```
//!
//! Timestamps are quoted RFC 3339 strings. Relative series paths are resolved
//! against the manifest's own directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use divlab_core::{ConfigError, SimConfig};

/// Errors from reading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse manifest TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid simulation config: {0}")]
    Config(#[from] ConfigError),
    #[error("manifest lists no games")]
    NoGames,
    #[error("duplicate game id '{0}'")]
    DuplicateGame(String),
}

/// One game entry in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameSpec {
    pub id: String,
    pub game_start: DateTime<Utc>,
    /// CSV with `timestamp,probability`.
    pub series_a: PathBuf,
    /// CSV with `timestamp,bid,ask,mid`.
    pub series_b: PathBuf,
}

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub games: Vec<GameSpec>,
}

impl BacktestConfig {
    /// Load a manifest from a TOML file, resolving series paths against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse a manifest from a TOML string. Paths are left as written.
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Make relative series paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for game in &mut self.games {
            for path in [&mut game.series_a, &mut game.series_b] {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// Check the simulation parameters and the game list.
    pub fn validate(&self) -> Result<(), ManifestError> {
        self.simulation.validate()?;
        if self.games.is_empty() {
            return Err(ManifestError::NoGames);
        }
        let mut seen = HashSet::new();
        for game in &self.games {
            if !seen.insert(game.id.as_str()) {
                return Err(ManifestError::DuplicateGame(game.id.clone()));
            }
        }
        Ok(())
    }
}
