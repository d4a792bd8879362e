//! # Configuration
//!
//! Layered configuration for the EduPlan binary:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config eduplan.toml`)
//! 3. `EDUPLAN_*` environment variables
//! 4. CLI flags (applied by the caller)
//!
//! ## Environment Variables
//!
//! - `EDUPLAN_API_KEY`: bearer key required by the HTTP API (unset or empty disables auth)
//! - `EDUPLAN_RATE_LIMIT`: requests per second (0 disables rate limiting)
//! - `EDUPLAN_CORS_ORIGINS`: comma-separated origins, or `*` for all
//! - `EDUPLAN_REMOTE_URL`: base URL of the remote curriculum service
//! - `EDUPLAN_ENFORCE_PREREQUISITES`: `true`/`false`, gate status writes on prerequisites

use clap::ValueEnum;
use eduplan_core::PlannerError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default base URL of the remote curriculum service.
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:8000";

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

impl From<ConfigError> for PlannerError {
    fn from(e: ConfigError) -> Self {
        PlannerError::Config(e.to_string())
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Storage backend for progress records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Disk-backed redb database.
    #[default]
    Redb,
    /// Volatile in-memory store.
    Memory,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub rate_limit: u32,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// The configured API key, if it is non-empty.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            database: PathBuf::from("eduplan.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub enforce_prerequisites: bool,
    /// JSON file of catalog documents; the bundled demo catalogs are used when unset.
    pub catalogs: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REMOTE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub planner: PlannerConfig,
    pub remote: RemoteConfig,
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Load defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let read_err = |reason: String| ConfigError::Read {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = std::fs::metadata(path).map_err(|e| read_err(e.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(read_err(format!(
                "file size {} exceeds maximum {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        Self::from_toml(&text).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Overlay `EDUPLAN_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("EDUPLAN_API_KEY") {
            self.server.api_key = Some(key).filter(|k| !k.is_empty());
        }

        if let Some(value) = lookup("EDUPLAN_RATE_LIMIT") {
            self.server.rate_limit =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: "EDUPLAN_RATE_LIMIT",
                        value,
                    })?;
        }

        if let Some(value) = lookup("EDUPLAN_CORS_ORIGINS") {
            self.server.cors_origins = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(url) = lookup("EDUPLAN_REMOTE_URL").filter(|u| !u.trim().is_empty()) {
            self.remote.url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(value) = lookup("EDUPLAN_ENFORCE_PREREQUISITES") {
            self.planner.enforce_prerequisites = parse_bool(&value).ok_or(
                ConfigError::InvalidEnv {
                    var: "EDUPLAN_ENFORCE_PREREQUISITES",
                    value,
                },
            )?;
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
