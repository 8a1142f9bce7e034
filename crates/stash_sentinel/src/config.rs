//! Configuration management for the stash sentinel.
//!
//! This module handles loading, validation, and conversion of the sentinel
//! configuration from TOML files.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stash_monitor::MonitorConfig;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default poll interval for serde deserialization
fn default_poll_interval_ms() -> u64 {
    1000
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// What to watch and when to alert
    pub watch: WatchSettings,
    /// Where dispatches are written besides the log
    #[serde(default)]
    pub output: OutputSettings,
    /// Logging configuration settings
    pub logging: LoggingSettings,
}

/// Log file and detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Admin log file to tail
    pub log_file: String,
    /// How often the file watcher compares the log file, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Removals further than this many meters from the storage raise an alert
    pub max_distance: f64,
    /// Storage type keywords whose removals are aggregated per player
    #[serde(default)]
    pub storage_types: Vec<String>,
}

/// Dispatch output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Optional file that receives one JSON object per dispatch
    pub json_lines_path: Option<String>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watch: WatchSettings {
                log_file: "logs/server.ADM".to_string(),
                poll_interval_ms: default_poll_interval_ms(),
                max_distance: 10.0,
                storage_types: vec![
                    "Barrel".to_string(),
                    "Tent".to_string(),
                    "Crate".to_string(),
                    "Chest".to_string(),
                ],
            },
            output: OutputSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to that
    /// path and returns it.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("Failed to write default config to {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the file settings into the monitor's startup settings.
    pub fn to_monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new(&self.watch.log_file, self.watch.storage_types.clone());
        config.poll_interval = Duration::from_millis(self.watch.poll_interval_ms);
        config
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.watch.log_file.trim().is_empty() {
            return Err("Log file path cannot be empty".to_string());
        }

        if self.watch.poll_interval_ms == 0 {
            return Err("Poll interval must be greater than zero".to_string());
        }

        if !self.watch.max_distance.is_finite() || self.watch.max_distance < 0.0 {
            return Err(format!(
                "Maximum distance must be a finite, non-negative number, got {}",
                self.watch.max_distance
            ));
        }

        if self.watch.storage_types.iter().any(|t| t.trim().is_empty()) {
            return Err("Storage types cannot contain empty entries".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.watch.log_file, "logs/server.ADM");
        assert_eq!(config.watch.poll_interval_ms, 1000);
        assert_eq!(config.watch.max_distance, 10.0);
        assert_eq!(config.watch.storage_types.len(), 4);
        assert!(config.output.json_lines_path.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_writes_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stash_sentinel.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.watch.log_file, "logs/server.ADM");
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.watch.storage_types, config.watch.storage_types);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[watch]
log_file = "/srv/dayz/profiles/DayZServer_x64.ADM"
poll_interval_ms = 250
max_distance = 7.5
storage_types = ["Barrel", "Sea Chest"]

[output]
json_lines_path = "/var/log/stash_sentinel.jsonl"

[logging]
level = "debug"
json_format = true
"#;

        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), toml_content).await.unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.watch.log_file, "/srv/dayz/profiles/DayZServer_x64.ADM");
        assert_eq!(config.watch.poll_interval_ms, 250);
        assert_eq!(config.watch.max_distance, 7.5);
        assert_eq!(config.watch.storage_types, vec!["Barrel", "Sea Chest"]);
        assert_eq!(
            config.output.json_lines_path,
            Some("/var/log/stash_sentinel.jsonl".to_string())
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_serde_defaults_for_optional_fields() {
        let toml_content = r#"
[watch]
log_file = "server.ADM"
max_distance = 5.0

[logging]
level = "info"
json_format = false
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.watch.poll_interval_ms, 1000);
        assert!(config.watch.storage_types.is_empty());
        assert!(config.output.json_lines_path.is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "[watch\nlog_file = ").await.unwrap();
        assert!(AppConfig::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_to_monitor_config() {
        let mut config = AppConfig::default();
        config.watch.poll_interval_ms = 250;

        let monitor_config = config.to_monitor_config();
        assert_eq!(monitor_config.log_file, PathBuf::from("logs/server.ADM"));
        assert_eq!(monitor_config.poll_interval, Duration::from_millis(250));
        assert_eq!(monitor_config.storage_types, config.watch.storage_types);
        assert_eq!(monitor_config.aggregation_window, stash_monitor::DEBOUNCE_INTERVAL);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AppConfig::default();
        config.watch.log_file = " ".to_string();
        assert!(config.validate().unwrap_err().contains("Log file"));

        let mut config = AppConfig::default();
        config.watch.poll_interval_ms = 0;
        assert!(config.validate().unwrap_err().contains("Poll interval"));

        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let mut config = AppConfig::default();
            config.watch.max_distance = bad;
            assert!(config.validate().unwrap_err().contains("Maximum distance"));
        }

        let mut config = AppConfig::default();
        config.watch.storage_types.push(String::new());
        assert!(config.validate().unwrap_err().contains("Storage types"));

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("Invalid log level"));
    }

    #[test]
    fn test_validation_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = AppConfig::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "Level '{}' should be valid", level);
        }
    }
}
