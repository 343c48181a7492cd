// src/stats/reporter.rs
use crate::stats::aggregator::HashRateTable;
use crate::stats::format::format_hash_rate;
use crate::types::DeviceInfo;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Snapshot of mining performance across all devices
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Sum of the latest per-device hashrates (hashes per second)
    pub hash_rate: u64,
    /// Human readable form of `hash_rate`
    pub hash_rate_str: String,
    /// Per-device breakdown
    pub devices: Vec<DeviceInfo>,
}

/// Periodically logs the hashrate table
pub struct StatsReporter {
    /// Table fed by the output interpreter
    table: Arc<HashRateTable>,
    /// Interval at which stats are reported
    report_interval: Duration,
    /// Dropping the sender side stops the reporting thread
    shutdown: Sender<()>,
    shutdown_rx: Receiver<()>,
}

impl StatsReporter {
    /// Creates a new StatsReporter with the specified reporting interval
    ///
    /// # Arguments
    /// * `table` - Hashrate table to report on
    /// * `report_interval` - How often to log statistics
    pub fn new(table: Arc<HashRateTable>, report_interval: Duration) -> Self {
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded(1);
        StatsReporter {
            table,
            report_interval,
            shutdown,
            shutdown_rx,
        }
    }

    /// Gets the current mining statistics
    ///
    /// The total and the device list come from two separate locked reads,
    /// so a line parsed in between may make them differ momentarily.
    pub fn get_stats(&self) -> MiningStats {
        let hash_rate = self.table.hash_rate();
        MiningStats {
            hash_rate,
            hash_rate_str: format_hash_rate(hash_rate),
            devices: self.table.devices(),
        }
    }

    /// Starts the periodic reporting of statistics
    ///
    /// Spawns a background thread that logs stats at the configured
    /// interval until [`StatsReporter::stop`] is called.
    pub fn start_reporting(&self) -> JoinHandle<()> {
        let reporter = StatsReporter {
            table: self.table.clone(),
            report_interval: self.report_interval,
            shutdown: self.shutdown.clone(),
            shutdown_rx: self.shutdown_rx.clone(),
        };

        std::thread::spawn(move || {
            let ticker = crossbeam_channel::tick(reporter.report_interval);

            loop {
                crossbeam_channel::select! {
                    recv(ticker) -> _ => reporter.report(),
                    recv(reporter.shutdown_rx) -> _ => break,
                }
            }
            log::debug!("Stats reporter stopped");
        })
    }

    /// Stops a running reporting thread
    pub fn stop(&self) {
        let _ = self.shutdown.try_send(());
    }

    fn report(&self) {
        let stats = self.get_stats();
        log::info!(
            "Hashrate: {} | Devices: {}",
            stats.hash_rate_str,
            stats.devices.len()
        );
        for device in &stats.devices {
            log::debug!(
                "  {} #{} {}: {}",
                device.device_type,
                device.device_id,
                device.device_name,
                device.hash_rate_str
            );
        }
    }
}
