// src/template/mod.rs
//! Miner config file synthesis
//!
//! VerthashMiner writes its own default config with `--gen-conf`. This
//! module turns that template into the config the miner is started with:
//! - Connection and global directives are replaced with our own
//! - Integrated (Intel) OpenCL devices are dropped unless allowed
//! - Everything else is copied through unchanged

/// Device config block parsing
pub mod devices;

/// Line-by-line template rewriting
pub mod synthesizer;

pub use devices::{CommentBlockParser, DeviceBlockParser, ParsedDeviceConfigEntry};
pub use synthesizer::{TemplateRewriter, synthesize_config};

use std::io::{self, BufRead};
use std::path::Path;

const DEVICE_DECLARATION_PREFIXES: [&str; 2] = ["<CL_Device", "<CU_Device"];

/// Counts the OpenCL and CUDA device declarations in a template
pub fn count_device_declarations<R: BufRead>(input: R) -> io::Result<usize> {
    let mut count = 0;
    for line in input.lines() {
        let line = line?;
        if DEVICE_DECLARATION_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
        {
            count += 1;
        }
    }
    Ok(count)
}

/// Removes a file left over from a previous run, if present
pub(crate) fn remove_stale(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed stale {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
    }
}
