//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [ranking]
//! stats_ttl_secs = 600
//! exclude_percent = 10.0
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::statistics::DEFAULT_EXCLUDE_PERCENT;

/// Upper bound for `ranking.stats_ttl_secs` (one week).
pub const MAX_STATS_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Lifetime of a cached population summary, in seconds.
    pub stats_ttl_secs: u64,
    /// Share trimmed from each end by the statistics report, in percent.
    pub exclude_percent: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            stats_ttl_secs: 600,
            exclude_percent: DEFAULT_EXCLUDE_PERCENT,
        }
    }
}

impl RankingConfig {
    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub ranking: RankingConfig,
}

impl Config {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ttl = self.ranking.stats_ttl_secs;
        if ttl == 0 || ttl > MAX_STATS_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "ranking.stats_ttl_secs must be in [1, {MAX_STATS_TTL_SECS}], got {ttl}"
            )));
        }
        let pct = self.ranking.exclude_percent;
        if !(0.0..50.0).contains(&pct) {
            return Err(ConfigError::Invalid(format!(
                "ranking.exclude_percent must be in [0, 50), got {pct}"
            )));
        }
        Ok(())
    }
}
