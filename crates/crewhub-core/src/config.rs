//! CrewHub configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewHubConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
}

impl Default for CrewHubConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            gateway: GatewayConfig::default(),
            reminders: ReminderConfig::default(),
        }
    }
}

impl CrewHubConfig {
    /// Load config from the default path (~/.crewhub/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::CrewHubError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::CrewHubError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CrewHubError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the CrewHub home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".crewhub")
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.crewhub/crewhub.db".into() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Reminder scheduler cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// Short-cycle interval between reminder sweeps, in minutes.
    #[serde(default = "default_check_interval_mins")]
    pub check_interval_mins: u64,
    /// Delay before the very first short-cycle run after boot, in seconds.
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    /// Delay before the best-effort early daily run after boot, in seconds.
    #[serde(default = "default_daily_early_run_secs")]
    pub daily_early_run_secs: u64,
}

fn bool_true() -> bool { true }
fn default_check_interval_mins() -> u64 { 30 }
fn default_warmup_secs() -> u64 { 60 }
fn default_daily_early_run_secs() -> u64 { 120 }

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_mins: default_check_interval_mins(),
            warmup_secs: default_warmup_secs(),
            daily_early_run_secs: default_daily_early_run_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CrewHubConfig::default();
        assert_eq!(cfg.reminders.check_interval_mins, 30);
        assert_eq!(cfg.reminders.warmup_secs, 60);
        assert_eq!(cfg.gateway.port, 8080);
        assert!(cfg.reminders.enabled);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: CrewHubConfig = toml::from_str(
            "[reminders]\ncheck_interval_mins = 5\n",
        )
        .unwrap();
        assert_eq!(cfg.reminders.check_interval_mins, 5);
        assert_eq!(cfg.reminders.warmup_secs, 60);
        assert_eq!(cfg.gateway.host, "127.0.0.1");
    }
}
