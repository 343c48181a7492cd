// src/miner/mod.rs
//! Miner binary driving
//!
//! This module contains everything that talks to the external miner:
//! - Launching the binary and collecting its output
//! - The VerthashMiner driver (config synthesis, output parsing, queries)

/// Miner binary invocation
///
/// Defines the [`BinaryRunner`] seam and its `std::process` implementation.
pub mod runner;

/// VerthashMiner driver
pub mod verthash;

pub use self::runner::{BinaryRunner, ExitOutcome, ProcessRunner};
pub use self::verthash::VerthashMiner;

use crate::types::DeviceInfo;
use crate::utils::error::MinerError;

/// Connection and device options for a miner run
///
/// Values are written into the miner config as-is; validating them is
/// the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArguments {
    /// Pool URL, e.g. `stratum+tcp://pool.example.com:3333`
    pub stratum_url: String,
    /// Pool username, usually the payout address
    pub stratum_username: String,
    /// Pool password
    pub stratum_password: String,
    /// Keep integrated (Intel) OpenCL devices in the config
    pub enable_integrated: bool,
}

/// Common interface of a driven miner binary
///
/// `configure` and `available_gpus` each block on a full run of the
/// binary. The query methods may be called from any thread while output
/// is being parsed.
pub trait MinerImpl {
    /// Writes the config the miner will be started with
    fn configure(&mut self, args: &BinaryArguments) -> Result<(), MinerError>;

    /// Consumes one line of miner output; never fails
    fn parse_output(&self, line: &str);

    /// Total hashrate across all devices (hashes per second)
    fn hash_rate(&self) -> u64;

    /// Arguments to start the miner with after `configure`
    fn construct_command_line_args(&self, args: &BinaryArguments) -> Vec<String>;

    /// Number of OpenCL and CUDA devices the miner detects, 0 on failure
    fn available_gpus(&mut self) -> u8;

    /// Snapshot of every device seen so far
    fn devices(&self) -> Vec<DeviceInfo>;
}
