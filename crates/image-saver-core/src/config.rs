use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hashing::HashAlgorithm;

/// Default endpoint listing random images as `[{ "id": .., "url": .. }]`
pub const DEFAULT_SOURCE_URL: &str = "https://api.thecatapi.com/v1/images/search";

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for fetching and storing images
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the stored images
    pub store_dir: PathBuf,

    /// Network timeout for a single request, in seconds
    pub fetch_timeout_secs: u64,

    /// Endpoint returning the list of candidate images
    pub source_url: String,

    /// Digest used to name and compare stored images
    pub hash_algorithm: HashAlgorithm,

    /// Directory for rotated log files; logs go to stderr when unset
    pub log_dir: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("data"),
            fetch_timeout_secs: 30,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            hash_algorithm: HashAlgorithm::Sha256,
            log_dir: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Configuration(
                "Fetch timeout must be at least one second".to_string(),
            ));
        }

        if self.source_url.trim().is_empty() {
            return Err(Error::Configuration(
                "Source URL must not be empty".to_string(),
            ));
        }

        if self.store_dir.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "Store directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
