use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AppResult;

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "SCREENPLAN_API_URL";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Where the login session is kept between runs
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL, including the version prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
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

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_session_file() -> PathBuf {
    PathBuf::from("./etc/session.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            log: LogConfig::default(),
            session_file: default_session_file(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no file is present
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }
}
