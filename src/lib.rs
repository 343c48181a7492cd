//! Verthash miner driver - runs the VerthashMiner binary and tracks its hashrate
//!
//! This crate drives an external VerthashMiner executable:
//! - Generates the miner config from the miner's own template
//! - Interprets the miner's status output as it runs
//! - Keeps a thread-safe per-device hashrate table for live queries
//! - Reports hashrate periodically through the log

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner binary invocation and the VerthashMiner driver
pub mod miner;

/// Hashrate collection, interpretation and reporting
pub mod stats;

/// Miner config file synthesis from the vendor template
pub mod template;

/// Known mining pool presets
pub mod pools;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Driver configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use cli::Commands;
pub use config::Config;
pub use miner::{BinaryArguments, BinaryRunner, MinerImpl, ProcessRunner, VerthashMiner};
pub use pools::Pool;
pub use stats::{HashRateTable, MiningStats, OutputInterpreter, StatsReporter, format_hash_rate};
pub use types::{DeviceClass, DeviceInfo};
pub use utils::{MinerError, init_logging};
