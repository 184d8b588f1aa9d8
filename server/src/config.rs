use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::Level;

/// Configuration for the HTTP backend, usually read from YAML.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human readable text.
    #[serde(default)]
    pub json_logs: bool,

    /// Directory holding the web client bundle. When unset only `/api` is served.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default = "default_cors")]
    pub cors: bool,
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

/// Per-IP request budget: up to `burst` requests at once, refilled by one
/// every `period_ms` milliseconds.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RateLimit {
    pub period_ms: u64,
    pub burst: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
}

/// [Config] with every field checked and converted.
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub port: u16,
    pub log_level: Level,
    pub json_logs: bool,
    pub static_dir: Option<PathBuf>,
    pub cors: bool,
    pub rate_limit: Option<RateLimit>,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
            static_dir: None,
            cors: default_cors(),
            rate_limit: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        if let Some(limit) = self.rate_limit {
            if limit.period_ms == 0 {
                return Err(ConfigError::InvalidNonZero {
                    field: "rate_limit.period_ms",
                    value: 0,
                });
            }
            if limit.burst == 0 {
                return Err(ConfigError::InvalidNonZero {
                    field: "rate_limit.burst",
                    value: 0,
                });
            }
        }

        Ok(ValidatedConfig {
            port: self.port,
            log_level,
            json_logs: self.json_logs,
            static_dir: self.static_dir,
            cors: self.cors,
            rate_limit: self.rate_limit,
        })
    }
}
