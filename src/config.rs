use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::services::ControllerOptions;
use crate::view::{MAX_DURATION_SECS, MIN_DURATION_SECS};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// File the menu-bar label is written to; log-only when unset
    #[serde(default = "default_status_file")]
    pub status_file: Option<PathBuf>,

    /// Quick-select durations in seconds
    #[serde(default = "default_quick_presets")]
    pub quick_presets: Vec<u64>,

    #[serde(default = "default_notification_timeout_ms")]
    pub notification_timeout_ms: u64,

    #[serde(default = "default_flash_interval_ms")]
    pub flash_interval_ms: u64,
}

fn default_app_name() -> String {
    "Chronos".to_string()
}

fn default_status_file() -> Option<PathBuf> {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(|dir| PathBuf::from(dir).join("chronos").join("status"))
}

fn default_quick_presets() -> Vec<u64> {
    vec![300, 600, 900, 1500, 1800, 3600]
}

fn default_notification_timeout_ms() -> u64 {
    5000
}

fn default_flash_interval_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            status_file: default_status_file(),
            quick_presets: default_quick_presets(),
            notification_timeout_ms: default_notification_timeout_ms(),
            flash_interval_ms: default_flash_interval_ms(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/chronos/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Directory holding the config and both settings files
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("chronos"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Where the controller persists notification settings
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Where the timer window keeps its local copy of the toggles
    pub fn view_settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("view-settings.json"))
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            notification_timeout: Duration::from_millis(self.notification_timeout_ms),
            flash_interval: Duration::from_millis(self.flash_interval_ms),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(anyhow::anyhow!("app_name cannot be empty"));
        }

        if let Some(preset) = self
            .quick_presets
            .iter()
            .find(|p| !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(*p))
        {
            return Err(anyhow::anyhow!(
                "quick preset {}s is outside {}..={} seconds",
                preset,
                MIN_DURATION_SECS,
                MAX_DURATION_SECS
            ));
        }

        if self.notification_timeout_ms == 0 {
            return Err(anyhow::anyhow!("notification_timeout_ms must be positive"));
        }

        if self.flash_interval_ms == 0 {
            return Err(anyhow::anyhow!("flash_interval_ms must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.quick_presets.len(), 6);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"app_name": "Tea"}"#).unwrap();

        assert_eq!(config.app_name, "Tea");
        assert_eq!(config.quick_presets, default_quick_presets());
        assert_eq!(config.notification_timeout_ms, 5000);

        let options = config.controller_options();
        assert_eq!(options.notification_timeout, Duration::from_secs(5));
        assert_eq!(options.flash_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_explicit_null_status_file_disables_it() {
        let config: Config = serde_json::from_str(r#"{"status_file": null}"#).unwrap();
        assert!(config.status_file.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_preset() {
        let config = Config {
            quick_presets: vec![300, 10],
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            quick_presets: vec![21601],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_intervals() {
        let config = Config {
            flash_interval_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            notification_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
