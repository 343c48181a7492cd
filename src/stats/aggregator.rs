// src/stats/aggregator.rs
//! Per-device hashrate table
//!
//! All rate and name tables live behind a single lock so that totals and
//! snapshots are always taken from one consistent state.

use crate::stats::format::format_hash_rate;
use crate::types::{DeviceClass, DeviceIndex, DeviceInfo};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Rates and names observed for one device class
#[derive(Debug, Default)]
struct ClassTable {
    rates: BTreeMap<DeviceIndex, u64>,
    names: BTreeMap<DeviceIndex, String>,
}

#[derive(Debug, Default)]
struct Tables {
    opencl: ClassTable,
    cuda: ClassTable,
    metal: ClassTable,
}

impl Tables {
    fn class(&self, class: DeviceClass) -> &ClassTable {
        match class {
            DeviceClass::OpenCL => &self.opencl,
            DeviceClass::CUDA => &self.cuda,
            DeviceClass::Metal => &self.metal,
        }
    }

    fn class_mut(&mut self, class: DeviceClass) -> &mut ClassTable {
        match class {
            DeviceClass::OpenCL => &mut self.opencl,
            DeviceClass::CUDA => &mut self.cuda,
            DeviceClass::Metal => &mut self.metal,
        }
    }
}

/// Thread-safe table of the latest hashrate and name per device
///
/// Written by the output listener thread, read from any number of
/// threads. Records are created on first observation and never removed;
/// a device that stops reporting keeps its last known rate.
#[derive(Debug, Default)]
pub struct HashRateTable {
    tables: Mutex<Tables>,
}

impl HashRateTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the latest rate for a device, replacing any previous value
    pub fn record_rate(&self, class: DeviceClass, index: DeviceIndex, rate: u64) {
        let mut tables = self.tables.lock();
        tables.class_mut(class).rates.insert(index, rate);
    }

    /// Stores the display name for a device
    pub fn record_name(&self, class: DeviceClass, index: DeviceIndex, name: String) {
        let mut tables = self.tables.lock();
        tables.class_mut(class).names.insert(index, name);
    }

    /// Latest rate for one device, if any was observed
    pub fn rate(&self, class: DeviceClass, index: DeviceIndex) -> Option<u64> {
        self.tables.lock().class(class).rates.get(&index).copied()
    }

    /// Sum of the latest rates of every device in every class
    pub fn hash_rate(&self) -> u64 {
        let tables = self.tables.lock();
        DeviceClass::ALL
            .iter()
            .flat_map(|class| tables.class(*class).rates.values())
            .fold(0u64, |total, rate| total.saturating_add(*rate))
    }

    /// Snapshot of every device with a reported rate
    ///
    /// Ordered by class (OpenCL, CUDA, Metal), then ascending index.
    /// Devices without a reported name get the class default label.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        let tables = self.tables.lock();
        let mut devices = Vec::new();

        for class in DeviceClass::ALL {
            let table = tables.class(class);
            for (&index, &rate) in &table.rates {
                let name = table
                    .names
                    .get(&index)
                    .filter(|name| !name.is_empty())
                    .cloned()
                    .unwrap_or_else(|| class.default_name(index));

                devices.push(DeviceInfo {
                    device_id: index,
                    device_name: name,
                    device_type: class,
                    hash_rate: rate,
                    hash_rate_str: format_hash_rate(rate),
                });
            }
        }

        devices
    }

    /// Number of devices with a reported rate
    pub fn device_count(&self) -> usize {
        let tables = self.tables.lock();
        DeviceClass::ALL
            .iter()
            .map(|class| tables.class(*class).rates.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_latest_observation_wins() {
        let table = HashRateTable::new();
        table.record_rate(DeviceClass::OpenCL, 1, 1000);
        table.record_rate(DeviceClass::OpenCL, 1, 2500);

        let devices = table.devices();
        assert_eq!(devices.len(), 1, "second observation must not add a record");
        assert_eq!(devices[0].hash_rate, 2500);
        assert_eq!(table.hash_rate(), 2500);
    }

    #[test]
    fn test_total_sums_all_classes() {
        let table = HashRateTable::new();
        table.record_rate(DeviceClass::OpenCL, 0, 100);
        table.record_rate(DeviceClass::OpenCL, 1, 200);
        table.record_rate(DeviceClass::CUDA, 0, 300);
        table.record_rate(DeviceClass::Metal, 0, 400);

        assert_eq!(table.hash_rate(), 1000);
        assert_eq!(table.device_count(), 4);
    }

    #[test]
    fn test_same_index_in_different_classes_is_distinct() {
        let table = HashRateTable::new();
        table.record_rate(DeviceClass::OpenCL, 0, 10);
        table.record_rate(DeviceClass::CUDA, 0, 20);

        let devices = table.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_type, DeviceClass::OpenCL);
        assert_eq!(devices[1].device_type, DeviceClass::CUDA);
    }

    #[test]
    fn test_default_and_reported_names() {
        let table = HashRateTable::new();
        table.record_rate(DeviceClass::CUDA, 2, 1500);
        table.record_name(DeviceClass::Metal, 0, "AMD Radeon Pro 5500M".to_string());
        table.record_rate(DeviceClass::Metal, 0, 12_500);

        let devices = table.devices();
        assert_eq!(devices[0].device_name, "CUDA Device 2");
        assert_eq!(devices[0].hash_rate_str, "1.50 kH/s");
        assert_eq!(devices[1].device_name, "AMD Radeon Pro 5500M");
    }

    #[test]
    fn test_name_without_rate_is_not_listed() {
        let table = HashRateTable::new();
        table.record_name(DeviceClass::Metal, 0, "Apple M1".to_string());
        assert!(table.devices().is_empty());
        assert_eq!(table.hash_rate(), 0);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let table = Arc::new(HashRateTable::new());

        let writer = {
            let table = table.clone();
            thread::spawn(move || {
                for i in 0..1000u64 {
                    table.record_rate(DeviceClass::OpenCL, (i % 4) as u32, i);
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let devices = table.devices();
                        assert!(devices.len() <= 4);
                        let _ = table.hash_rate();
                    }
                })
            })
            .collect();

        writer.join().expect("writer panicked");
        for r in readers {
            r.join().expect("reader panicked");
        }

        // Last writes: 996, 997, 998, 999
        assert_eq!(table.hash_rate(), 996 + 997 + 998 + 999);
    }
}
