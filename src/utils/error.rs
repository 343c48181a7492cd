// src/utils/error.rs
use serde_json;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use url;

/// Main error type for the miner driver
///
/// Covers failures of the child miner process, the template and final
/// config files, and the driver's own configuration. Log line
/// interpretation never produces this type: malformed output is logged
/// and dropped.
#[derive(Error, Debug)]
pub enum MinerError {
    /// The miner binary could not be launched or waited on
    #[error("Process error: {0}")]
    ProcessError(String),

    /// The template dump run exited unsuccessfully
    #[error("Was unable to configure VerthashMiner. Exit code {0}")]
    ConfigGenerationError(i32),

    /// The vendor template could not be opened or read
    #[error("Template error at {}: {source}", .path.display())]
    TemplateError {
        /// Template file path
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// The final config file could not be created or written
    #[error("Config write error at {}: {source}", .path.display())]
    ConfigWriteError {
        /// Final config file path
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// Driver configuration file or parameter errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Converts TOML decoding errors into MinerError
///
/// Wraps the original error in a `ConfigError` variant.
impl From<toml::de::Error> for MinerError {
    fn from(e: toml::de::Error) -> Self {
        MinerError::ConfigError(format!("Invalid config format: {}", e))
    }
}
