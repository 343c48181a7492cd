// src/config/mod.rs
//! Driver configuration
//!
//! This module handles the driver's own settings file (TOML):
//! - Loading and validating configuration files
//! - Generating configuration templates
//! - Resolving the pool connection into miner arguments
//!
//! Not to be confused with the miner's config file, which is produced
//! by [`crate::template`].

/// Core configuration implementation
///
/// Contains the [`Config`] struct and related types that define
/// the driver's configuration structure.
pub mod config;

// Re-export key items for easy access
pub use config::{Config, ConnectionConfig, MinerSettings, PoolPresetConfig, StratumConfig};

use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads driver configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read, parsed or validated
pub fn load(path: impl Into<PathBuf>) -> Result<Config, MinerError> {
    Config::load(path)
}

/// Generates a commented configuration template
///
/// # Arguments
/// * `pool` - Use a pool preset section instead of explicit stratum settings
pub fn generate_template(pool: bool) -> String {
    Config::generate_template(pool)
}
