// src/template/devices.rs
//! Device config block parsing
//!
//! The vendor template lists the detected devices inside a block of
//! comment lines. Each device is a group of `Key: Value` comment lines,
//! separated from the next group by an empty comment line:
//!
//! ```text
//! # 1. Device: Intel(R) UHD Graphics 630
//! #    Platform: Intel(R) OpenCL HD Graphics
//! #    Vendor: Intel(R) Corporation
//! #    DeviceIndex: 0
//! #
//! ```
//!
//! Only the fields needed to decide which device declarations to keep are
//! extracted.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    /// List numbering in front of a key, e.g. `2. Device: ...`
    static ref NUMBERING_RE: Regex = Regex::new(r"^\d+\.\s*").expect("valid regex");
}

/// One device described in the template's device config block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDeviceConfigEntry {
    /// Index used by the matching `<CL_Device ...>` / `<CU_Device ...>` line
    pub index: u32,
    /// Platform (driver) name, e.g. `Intel(R) OpenCL HD Graphics`
    pub platform: String,
    /// Device name
    pub device: String,
    /// Device vendor
    pub vendor: String,
}

impl ParsedDeviceConfigEntry {
    /// Whether the device runs on an Intel (integrated) platform
    pub fn is_intel(&self) -> bool {
        self.platform.contains("Intel")
    }
}

/// Turns a buffered device config block into entries keyed by index
pub trait DeviceBlockParser {
    /// Parses the raw block text (lines joined with `\n`)
    fn parse(&self, block: &str) -> BTreeMap<u32, ParsedDeviceConfigEntry>;
}

/// Parser for the `# Key: Value` comment layout
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentBlockParser;

impl DeviceBlockParser for CommentBlockParser {
    fn parse(&self, block: &str) -> BTreeMap<u32, ParsedDeviceConfigEntry> {
        parse_device_block(block)
    }
}

#[derive(Default)]
struct PendingEntry {
    index: Option<u32>,
    platform: String,
    device: String,
    vendor: String,
}

impl PendingEntry {
    fn flush_into(&mut self, entries: &mut BTreeMap<u32, ParsedDeviceConfigEntry>) {
        let pending = std::mem::take(self);
        if let Some(index) = pending.index {
            entries.insert(
                index,
                ParsedDeviceConfigEntry {
                    index,
                    platform: pending.platform,
                    device: pending.device,
                    vendor: pending.vendor,
                },
            );
        }
    }
}

/// Parses a device config block in the `# Key: Value` comment layout
///
/// Entries without a `DeviceIndex` are dropped. A later entry with the
/// same index replaces an earlier one.
pub fn parse_device_block(block: &str) -> BTreeMap<u32, ParsedDeviceConfigEntry> {
    let mut entries = BTreeMap::new();
    let mut pending = PendingEntry::default();

    for line in block.lines() {
        let body = line.trim_start_matches('#').trim();
        if body.is_empty() {
            pending.flush_into(&mut entries);
            continue;
        }

        let body = NUMBERING_RE.replace(body, "");
        let Some((key, value)) = body.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "deviceindex" | "device index" => {
                if pending.index.is_some() {
                    pending.flush_into(&mut entries);
                }
                match value.trim_matches('"').parse() {
                    Ok(index) => pending.index = Some(index),
                    Err(_) => log::debug!("Ignoring device index '{}'", value),
                }
            }
            "platform" | "platform name" => pending.platform = value.to_string(),
            "device" | "device name" | "name" => pending.device = value.to_string(),
            "vendor" => pending.vendor = value.to_string(),
            _ => {}
        }
    }
    pending.flush_into(&mut entries);

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "\
#
# 1. Device: Intel(R) UHD Graphics 630
#    Platform: Intel(R) OpenCL HD Graphics
#    Vendor: Intel(R) Corporation
#    DeviceIndex: 0
#
# 2. Device: Radeon RX 580
#    Platform: AMD Accelerated Parallel Processing
#    Vendor: Advanced Micro Devices, Inc.
#    DeviceIndex: 1
#
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
";

    #[test]
    fn test_parse_two_entries() {
        let entries = parse_device_block(BLOCK);
        assert_eq!(entries.len(), 2);

        let intel = &entries[&0];
        assert_eq!(intel.device, "Intel(R) UHD Graphics 630");
        assert!(intel.is_intel());

        let amd = &entries[&1];
        assert_eq!(amd.platform, "AMD Accelerated Parallel Processing");
        assert_eq!(amd.vendor, "Advanced Micro Devices, Inc.");
        assert!(!amd.is_intel());
    }

    #[test]
    fn test_index_without_blank_separator_starts_new_entry() {
        let block = "\
#  DeviceIndex: 0
#  Platform: Intel(R) OpenCL
#  DeviceIndex: 1
#  Platform: NVIDIA CUDA
";
        let entries = parse_device_block(block);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[&0].platform, "Intel(R) OpenCL");
        assert_eq!(entries[&1].platform, "NVIDIA CUDA");
    }

    #[test]
    fn test_entries_without_index_are_dropped() {
        let block = "#  Platform: Intel(R) OpenCL\n#  Device: UHD 630\n#\n";
        assert!(parse_device_block(block).is_empty());
    }

    #[test]
    fn test_quoted_index() {
        let entries = CommentBlockParser.parse("# DeviceIndex: \"3\"\n# Platform: Intel\n");
        assert_eq!(entries[&3].platform, "Intel");
    }
}
