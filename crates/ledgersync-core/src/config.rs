//! Configuration module for LedgerSync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, defaults, and a platform-appropriate default path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for LedgerSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub connectivity: ConnectivityConfig,
    pub snapshots: SnapshotsConfig,
    pub logging: LoggingConfig,
}

/// Remote resource service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST resource service.
    pub base_url: String,
    /// Seconds before the startup health probe gives up.
    pub health_timeout_secs: u64,
    /// Seconds before any other remote call gives up.
    pub request_timeout_secs: u64,
}

/// Local durable storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the SQLite database holding snapshots and the mutation queue.
    pub db_path: PathBuf,
}

/// Connectivity monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Seconds the link must stay up before an offline→online transition
    /// is reported (hysteresis against flapping links).
    pub online_stability_secs: u64,
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotsConfig {
    /// Milliseconds of quiet before a debounced snapshot save is flushed.
    pub debounce_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/ledgersync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("ledgersync")
            .join("config.yaml")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            health_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("ledgersync")
                .join("state.db"),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            online_stability_secs: 5,
        }
    }
}

impl Default for SnapshotsConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.health_timeout_secs, 5);
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.connectivity.online_stability_secs, 5);
        assert_eq!(config.snapshots.debounce_ms, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_partial_yaml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api:\n  base_url: https://finance.example.com\nlogging:\n  level: debug"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://finance.example.com");
        assert_eq!(config.logging.level, "debug");
        // untouched sections keep their defaults
        assert_eq!(config.api.health_timeout_secs, 5);
        assert_eq!(config.snapshots.debounce_ms, 100);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_path_ends_with_expected_suffix() {
        let path = Config::default_path();
        assert!(path.ends_with("ledgersync/config.yaml"));
    }
}
