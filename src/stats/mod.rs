//! Hashrate collection and reporting
//!
//! This module turns the miner's status output into live statistics:
//! - [`OutputInterpreter`] recognizes hashrate and device lines
//! - [`HashRateTable`] keeps the latest rate and name per device
//! - [`StatsReporter`] logs the table periodically
//!

/// Lock-guarded per-device hashrate table
pub mod aggregator;

/// Hashrate display formatting
pub mod format;

/// Miner output line recognizers
pub mod interpreter;

/// Periodic statistics logging
pub mod reporter;

// Re-export main components
pub use aggregator::HashRateTable;
pub use format::format_hash_rate;
pub use interpreter::{Observation, OutputInterpreter, RateParseError};
pub use reporter::{MiningStats, StatsReporter};
