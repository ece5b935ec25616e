//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/docquery/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/docquery/` (~/.config/docquery/)
//! - Data: `$XDG_DATA_HOME/docquery/` (~/.local/share/docquery/)
//! - State/Logs: `$XDG_STATE_HOME/docquery/` (~/.local/state/docquery/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "DOCQUERY_API_URL";

/// Largest history cap accepted by [`HistoryConfig`]
pub const MAX_HISTORY_CAP: usize = 50;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Answer backend connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Search history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Analytics polling settings
    #[serde(default)]
    pub stats: StatsConfig,

    /// Terminal UI preferences
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Answer backend connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend base URL (e.g., `http://localhost:8000`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must start with http:// or https:// (got {:?})",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Search history settings
#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Maximum number of remembered questions
    #[serde(default = "default_history_cap")]
    pub cap: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cap: default_history_cap(),
        }
    }
}

fn default_history_cap() -> usize {
    5
}

/// Analytics polling settings
#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    /// Seconds between stats fetches
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl StatsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_poll_interval() -> u64 {
    10
}

/// Color palette for the terminal UI
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Returns the other palette
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Terminal UI preferences
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    /// Initial palette
    #[serde(default)]
    pub theme: Theme,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    ///
    /// `DOCQUERY_API_URL`, when set, overrides `api.base_url`.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(base_url = %url, "Using API URL from environment");
                config.api.base_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Replace the backend base URL (e.g. from a command-line flag)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self> {
        self.api.base_url = url.into();
        self.api.validate()?;
        Ok(self)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        if self.history.cap == 0 || self.history.cap > MAX_HISTORY_CAP {
            return Err(Error::Config(format!(
                "history.cap must be between 1 and {}",
                MAX_HISTORY_CAP
            )));
        }
        if self.stats.poll_interval_secs == 0 {
            return Err(Error::Config(
                "stats.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/docquery/config.toml` (~/.config/docquery/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("docquery").join("config.toml")
    }

    /// Returns the data directory path (for the history file)
    ///
    /// `$XDG_DATA_HOME/docquery/` (~/.local/share/docquery/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("docquery")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/docquery/` (~/.local/state/docquery/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("docquery")
    }

    /// Returns the search history file path
    ///
    /// `$XDG_DATA_HOME/docquery/history.json`
    pub fn history_path() -> PathBuf {
        Self::data_dir().join("history.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/docquery/docquery.log` (~/.local/state/docquery/docquery.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("docquery.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.history.cap, 5);
        assert_eq!(config.stats.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.ui.theme, Theme::Light);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://qa.example.com"
timeout_secs = 45

[history]
cap = 6

[stats]
poll_interval_secs = 5

[ui]
theme = "dark"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.api.base_url, "https://qa.example.com");
        assert_eq!(config.api.timeout_secs, 45);
        assert_eq!(config.history.cap, 6);
        assert_eq!(config.stats.poll_interval_secs, 5);
        assert_eq!(config.ui.theme, Theme::Dark);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[api]\nbase_url = \"http://10.0.0.2:9000\"\n").unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.history.cap, 5);
    }

    #[test]
    fn test_api_config_validation() {
        let mut api = ApiConfig::default();
        assert!(api.validate().is_ok());

        api.base_url = "   ".to_string();
        assert!(api.validate().is_err());

        api.base_url = "ftp://example.com".to_string();
        assert!(api.validate().is_err());

        api.base_url = "http://example.com".to_string();
        api.timeout_secs = 0;
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_history_cap_validation() {
        let mut config = Config::default();
        config.history.cap = 0;
        assert!(config.validate().is_err());
        config.history.cap = MAX_HISTORY_CAP + 1;
        assert!(config.validate().is_err());
        config.history.cap = MAX_HISTORY_CAP;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.stats.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_api_url() {
        let config = Config::default()
            .with_api_url("http://127.0.0.1:8123")
            .unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8123");
        assert!(Config::default().with_api_url("localhost").is_err());
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_paths() {
        assert!(Config::history_path().ends_with("docquery/history.json"));
        assert!(Config::log_path().ends_with("docquery.log"));
        assert!(Config::config_path().ends_with("docquery/config.toml"));
    }
}
