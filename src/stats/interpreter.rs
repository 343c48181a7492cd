// src/stats/interpreter.rs
//! Miner output interpretation
//!
//! Recognizes the status lines VerthashMiner prints while running and
//! turns them into typed observations:
//!
//! - `Configured Metal worker for discrete GPU: <name>`
//! - `mtl_device: hashrate: 12.50 kH/s`
//! - `cl_device(2): hashrate: 1.00 MH/s` / `cu_device(0): hashrate: 500.00 H/s`
//!
//! Recognizers are independent of each other. Anything unrecognized or
//! malformed is logged and dropped; interpretation never fails.

use crate::stats::aggregator::HashRateTable;
use crate::types::{DeviceClass, DeviceIndex};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

const METAL_WORKER_MARKER: &str = "Configured Metal worker for discrete GPU:";
const METAL_RATE_MARKER: &str = "mtl_device:";
const DEVICE_RATE_MARKER: &str = "_device(";
const RATE_SUFFIX: &str = "H/s";

/// The miner drives a single Metal device, always reported as index 0
const METAL_DEVICE_INDEX: DeviceIndex = 0;

lazy_static! {
    /// Two-letter backend tag and index, e.g. `cl_device(2)`
    static ref DEVICE_TAG_RE: Regex =
        Regex::new(r"(.{2})_device\((\d+)\)").expect("valid regex");

    /// Rate value with optional magnitude letter, e.g. `12.50 kH/s`
    static ref RATE_RE: Regex =
        Regex::new(r"^(?P<value>.*?)\s*(?P<prefix>[KkMmGg]?)H/s$").expect("valid regex");
}

/// Something learned about a device from one output line
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The miner reported a device's display name
    DeviceName {
        /// Device backend
        class: DeviceClass,
        /// Device index
        index: DeviceIndex,
        /// Reported name
        name: String,
    },
    /// The miner reported a device's current hashrate
    HashRate {
        /// Device backend
        class: DeviceClass,
        /// Device index
        index: DeviceIndex,
        /// Hashes per second
        rate: u64,
    },
}

/// Reasons a hashrate line could not be turned into an observation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateParseError {
    /// No `": "` precedes the rate text
    #[error("no ': ' separator before the rate")]
    MissingSeparator,

    /// The text after the separator is not `<value> [K|M|G]H/s`
    #[error("unrecognized rate text '{0}'")]
    UnrecognizedRate(String),

    /// The value is not a finite, non-negative number
    #[error("invalid hashrate value '{0}'")]
    InvalidNumber(String),

    /// `_device(` is not followed by a tag and an integer index
    #[error("unrecognized device reference in '{0}'")]
    InvalidDevice(String),
}

/// Parses the trailing `<value> [K|M|G]H/s` of a hashrate line
///
/// The value is the text between the last `": "` and the unit. The result
/// is truncated to whole hashes per second.
pub fn parse_rate(line: &str) -> Result<u64, RateParseError> {
    let (_, tail) = line
        .rsplit_once(": ")
        .ok_or(RateParseError::MissingSeparator)?;

    let caps = RATE_RE
        .captures(tail)
        .ok_or_else(|| RateParseError::UnrecognizedRate(tail.to_string()))?;

    let value_str = &caps["value"];
    let value: f64 = value_str
        .parse()
        .map_err(|_| RateParseError::InvalidNumber(value_str.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(RateParseError::InvalidNumber(value_str.to_string()));
    }

    let multiplier = match caps["prefix"].to_ascii_uppercase().as_str() {
        "K" => 1_000.0,
        "M" => 1_000_000.0,
        "G" => 1_000_000_000.0,
        _ => 1.0,
    };

    Ok((value * multiplier) as u64)
}

/// Recognizes the Metal device identification line
pub fn recognize_metal_name(line: &str) -> Option<Observation> {
    if !line.contains(METAL_WORKER_MARKER) {
        return None;
    }
    let (_, name) = line.rsplit_once(": ")?;

    Some(Observation::DeviceName {
        class: DeviceClass::Metal,
        index: METAL_DEVICE_INDEX,
        name: name.to_string(),
    })
}

/// Recognizes a Metal hashrate line
pub fn recognize_metal_rate(line: &str) -> Option<Result<Observation, RateParseError>> {
    if !line.contains(METAL_RATE_MARKER) || !line.ends_with(RATE_SUFFIX) {
        return None;
    }

    Some(parse_rate(line).map(|rate| Observation::HashRate {
        class: DeviceClass::Metal,
        index: METAL_DEVICE_INDEX,
        rate,
    }))
}

/// Recognizes an OpenCL or CUDA hashrate line
pub fn recognize_device_rate(line: &str) -> Option<Result<Observation, RateParseError>> {
    if !line.contains(DEVICE_RATE_MARKER) || !line.ends_with(RATE_SUFFIX) {
        return None;
    }

    Some(parse_device_rate(line))
}

fn parse_device_rate(line: &str) -> Result<Observation, RateParseError> {
    let caps = DEVICE_TAG_RE
        .captures(line)
        .ok_or_else(|| RateParseError::InvalidDevice(line.to_string()))?;

    let class = DeviceClass::from_tag(&caps[1]);
    let index: DeviceIndex = caps[2]
        .parse()
        .map_err(|_| RateParseError::InvalidDevice(line.to_string()))?;
    let rate = parse_rate(line)?;

    Ok(Observation::HashRate { class, index, rate })
}

/// Interprets miner output lines into a shared [`HashRateTable`]
///
/// Cheap to clone; clones feed the same table.
#[derive(Debug, Clone)]
pub struct OutputInterpreter {
    table: Arc<HashRateTable>,
    debug: bool,
}

impl OutputInterpreter {
    /// Creates an interpreter feeding `table`
    ///
    /// With `debug` set, every raw line is echoed to the debug log.
    pub fn new(table: Arc<HashRateTable>, debug: bool) -> Self {
        OutputInterpreter { table, debug }
    }

    /// The table this interpreter writes to
    pub fn table(&self) -> &Arc<HashRateTable> {
        &self.table
    }

    /// Consumes one line of miner output
    ///
    /// Lines must be fed in the order the miner produced them. Never
    /// fails: malformed lines are logged and otherwise ignored.
    pub fn parse_output(&self, line: &str) {
        if self.debug {
            log::debug!("[VerthashMiner] {}", line);
        }
        let line = line.trim();

        if let Some(observation) = recognize_metal_name(line) {
            self.apply(observation);
        }

        if let Some(result) = recognize_metal_rate(line) {
            match result {
                Ok(observation) => self.apply(observation),
                Err(e) => log::warn!("Error parsing Metal hashrate: {}", e),
            }
        }

        if let Some(result) = recognize_device_rate(line) {
            match result {
                Ok(observation) => self.apply(observation),
                Err(e) => log::warn!("Error parsing hashrate: {}", e),
            }
        }
    }

    fn apply(&self, observation: Observation) {
        match observation {
            Observation::DeviceName { class, index, name } => {
                log::debug!("{} device {} identified as '{}'", class, index, name);
                self.table.record_name(class, index, name);
            }
            Observation::HashRate { class, index, rate } => {
                log::debug!("{} device {} hashrate = {}", class, index, rate);
                self.table.record_rate(class, index, rate);
            }
        }
    }
}
