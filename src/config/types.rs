//! Core configuration types and loading.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "config_io",
            Self::Parse(_) => "config_parse",
        }
    }
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ban list persistence and sweep cadence.
    pub bans: BansConfig,
    /// Punishment escalation.
    pub punish: PunishConfig,
    /// Log output.
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

/// Ban list configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BansConfig {
    /// Persisted ban list, replayed at startup (default: "bans.cfg").
    #[serde(default = "default_ban_file")]
    pub file: PathBuf,

    /// Seconds between expiry sweeps (default: 1).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Write the ban list on shutdown (default: true).
    #[serde(default = "default_true")]
    pub save_on_exit: bool,
}

impl BansConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for BansConfig {
    fn default() -> Self {
        Self {
            file: default_ban_file(),
            sweep_interval_secs: default_sweep_interval(),
            save_on_exit: true,
        }
    }
}

/// Punishment configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PunishConfig {
    /// Ban length applied when a punishment escalates (default: 30).
    #[serde(default = "default_escalation_minutes")]
    pub escalation_ban_minutes: u64,
}

impl Default for PunishConfig {
    fn default() -> Self {
        Self {
            escalation_ban_minutes: default_escalation_minutes(),
        }
    }
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_ban_file() -> PathBuf {
    PathBuf::from("bans.cfg")
}

fn default_sweep_interval() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_escalation_minutes() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
