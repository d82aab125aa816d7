//! Run configuration for `lyrics-enrich`.
//!
//! An optional TOML file supplies the values; explicit command-line flags
//! override them. Credentials never live here, they come from the environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runner::DelayPolicy;

pub const DEFAULT_INPUT: &str = "charts.csv";
pub const DEFAULT_OUTPUT: &str = "lyrics_enriched_tracks.csv";
pub const DEFAULT_TITLE_COLUMN: &str = "track_name";
pub const DEFAULT_ARTIST_COLUMN: &str = "artist_names";
pub const DEFAULT_MIN_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 1.5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title_column: String,
    pub artist_column: String,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    /// Connect/read timeout for each provider request.
    pub timeout_secs: u64,
    /// SQLite lyrics cache; disabled when unset.
    pub cache: Option<PathBuf>,
    /// Where to write run statistics as JSON; skipped when unset.
    pub stats: Option<PathBuf>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            title_column: DEFAULT_TITLE_COLUMN.to_string(),
            artist_column: DEFAULT_ARTIST_COLUMN.to_string(),
            min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache: None,
            stats: None,
        }
    }
}

impl EnrichConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config TOML {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validated politeness delay; `min > max` is a configuration error.
    pub fn delay_policy(&self) -> Result<DelayPolicy> {
        DelayPolicy::new(self.min_delay_secs, self.max_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
