/// Process configuration: JSON file, then environment overrides
use crate::application::PageStoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for the wiki process
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// SQLite database file, or `:memory:`
    pub database_path: String,
    /// Interface the HTTP listener binds to
    pub http_host: String,
    /// HTTP port; 0 picks a free one
    pub http_port: u16,
    /// Number of HTTP server replicas sharing the listener
    pub http_instances: usize,
    /// Upper bound on one storage call, in milliseconds
    pub storage_timeout_ms: u64,
    /// Pending storage requests before callers wait for a slot
    pub queue_capacity: usize,
}

impl Default for WikiConfig {
    fn default() -> Self {
        WikiConfig {
            database_path: "wiki.db".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            http_instances: 2,
            storage_timeout_ms: 5_000,
            queue_capacity: 64,
        }
    }
}

impl WikiConfig {
    /// Load the configuration.
    ///
    /// Starts from the JSON file at `path` if one is given (missing keys keep
    /// their defaults), applies `WIKI_*` environment overrides, then validates.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("WIKI_DB_PATH") {
            self.database_path = value;
        }
        if let Some(value) = lookup("WIKI_HTTP_HOST") {
            self.http_host = value;
        }
        if let Some(value) = lookup("WIKI_HTTP_PORT") {
            self.http_port = parse_env("WIKI_HTTP_PORT", value)?;
        }
        if let Some(value) = lookup("WIKI_HTTP_INSTANCES") {
            self.http_instances = parse_env("WIKI_HTTP_INSTANCES", value)?;
        }
        if let Some(value) = lookup("WIKI_STORAGE_TIMEOUT_MS") {
            self.storage_timeout_ms = parse_env("WIKI_STORAGE_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("WIKI_QUEUE_CAPACITY") {
            self.queue_capacity = parse_env("WIKI_QUEUE_CAPACITY", value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.http_instances == 0 {
            return Err(ConfigError::Invalid(
                "http_instances must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.storage_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "storage_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.database_path.is_empty() {
            return Err(ConfigError::Invalid(
                "database_path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn page_store(&self) -> PageStoreConfig {
        PageStoreConfig {
            call_timeout: self.storage_timeout(),
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
