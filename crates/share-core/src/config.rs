//! Configuration for the share index, search engine, and filelist subsystem.
//!
//! Supports TOML configuration files with sensible defaults, loaded from:
//! - macOS: ~/Library/Application Support/airshare/config.toml
//! - Linux: ~/.config/airshare/config.toml
//! - Windows: %APPDATA%/airshare/config.toml

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub share: ShareConfig,
    pub search: SearchConfig,
    pub filelist: FilelistConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            share: ShareConfig::default(),
            search: SearchConfig::default(),
            filelist: FilelistConfig::default(),
        }
    }
}

/// Share tree behavior: refresh cadence, bloom sizing, dupe policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Minimum interval between automatic refreshes of a single root.
    pub refresh_interval_secs: u64,
    /// Expected item count used to size a fresh bloom filter; too low
    /// raises the false-positive rate, too high wastes memory.
    pub bloom_expected_items: usize,
    /// Rebuild the bloom filter once it has absorbed this many inserts past
    /// its sizing estimate, instead of letting the false-positive rate climb
    /// unbounded between refreshes.
    pub bloom_rebuild_factor: f64,
    /// Skip files below this size when indexing (bytes).
    pub min_file_size: u64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 3600,
            bloom_expected_items: 65536,
            bloom_rebuild_factor: 1.5,
            min_file_size: 0,
        }
    }
}

/// Search engine behavior: SUDP key lifetime, fan-out limits, relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How long a generated SUDP key stays in the decrypt pool before being
    /// retired; newer keys are tried first on incoming results.
    pub sudp_key_ttl_secs: u64,
    /// Hard ceiling on results collected per `SearchInstance`, after which
    /// further incoming results are dropped rather than grouped.
    pub max_results: usize,
    /// Weight applied to a result's own score before adding grouped-hit
    /// count, in the `totalRelevance` computation.
    pub source_score_factor: f64,
    /// Lifetime of a `SearchInstance` before it stops accepting results.
    pub instance_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sudp_key_ttl_secs: 15 * 60,
            max_results: 200,
            source_score_factor: 1.0,
            instance_timeout_secs: 90,
        }
    }
}

/// Filelist generation/loading behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilelistConfig {
    /// Whether dupes (content also present in queue/other shares) get a
    /// `Dupe` attribute in generated partial-list XML.
    pub dupes_in_filelist: bool,
    /// Cache a loaded remote `DirectoryListing` for this long before
    /// re-fetching on re-navigation.
    pub cache_ttl_secs: u64,
}

impl Default for FilelistConfig {
    fn default() -> Self {
        Self {
            dupes_in_filelist: true,
            cache_ttl_secs: 600,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("failed to load config from {:?}: {}, using defaults", path, e);
                Self::default()
            }),
            None => {
                debug!("no config directory found, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        info!("loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        info!("saved config to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "airshare", "airshare").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn sample() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "parse error: {e}"),
            ConfigError::Serialize(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.search.sudp_key_ttl_secs, 900);
        assert!(config.filelist.dupes_in_filelist);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.share.refresh_interval_secs, config.share.refresh_interval_secs);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let toml_str = r#"
            [search]
            max_results = 50
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.search.max_results, 50);
        assert_eq!(config.share.refresh_interval_secs, 3600);
    }

    #[test]
    fn sample_contains_all_sections() {
        let sample = Config::sample();
        assert!(sample.contains("[share]"));
        assert!(sample.contains("[search]"));
        assert!(sample.contains("[filelist]"));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.share.refresh_interval_secs, 3600);
    }
}
