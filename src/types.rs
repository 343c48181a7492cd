// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compute backend a mining device is driven through
///
/// Each class has its own hashrate and name tables in the
/// aggregator, and its own label prefix for unnamed devices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceClass {
    /// OpenCL device (`cl_device(N)` in the miner output)
    OpenCL,

    /// CUDA device (`cu_device(N)` in the miner output)
    CUDA,

    /// Metal device (`mtl_device` in the miner output)
    ///
    /// The miner currently drives at most one Metal device,
    /// which is always reported as index 0.
    Metal,
}

impl DeviceClass {
    /// All classes in snapshot order
    pub const ALL: [DeviceClass; 3] = [DeviceClass::OpenCL, DeviceClass::CUDA, DeviceClass::Metal];

    /// Maps the two-letter tag in front of `_device(` to a class
    ///
    /// Only `cu` selects CUDA; every other tag is treated as OpenCL.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "cu" {
            DeviceClass::CUDA
        } else {
            DeviceClass::OpenCL
        }
    }

    /// Label used when the miner never reported a name for a device
    pub fn default_name(&self, index: DeviceIndex) -> String {
        format!("{} Device {}", self, index)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::OpenCL => write!(f, "OpenCL"),
            DeviceClass::CUDA => write!(f, "CUDA"),
            DeviceClass::Metal => write!(f, "Metal"),
        }
    }
}

/// Device index as assigned by the miner binary, unique per class
pub type DeviceIndex = u32;

/// Point-in-time view of one mining device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Index assigned by the miner binary
    pub device_id: DeviceIndex,
    /// Reported name, or `"<Class> Device <Index>"` when none was seen
    pub device_name: String,
    /// Backend the device runs on
    pub device_type: DeviceClass,
    /// Latest observed hashrate in hashes/second
    pub hash_rate: u64,
    /// Human readable hashrate, e.g. `"1.50 kH/s"`
    pub hash_rate_str: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_class_from_tag() {
        assert_eq!(DeviceClass::from_tag("cu"), DeviceClass::CUDA);
        assert_eq!(DeviceClass::from_tag("cl"), DeviceClass::OpenCL);
        assert_eq!(DeviceClass::from_tag("xx"), DeviceClass::OpenCL);
    }

    #[test]
    fn test_default_names() {
        assert_eq!(DeviceClass::OpenCL.default_name(3), "OpenCL Device 3");
        assert_eq!(DeviceClass::CUDA.default_name(0), "CUDA Device 0");
        assert_eq!(DeviceClass::Metal.default_name(0), "Metal Device 0");
    }
}
