// src/template/synthesizer.rs
//! Template to final config rewriting
//!
//! The template is processed line by line with two pieces of state:
//! whether output is suppressed after a replaced directive, and whether
//! the scan is inside the device config block. Any line starting with
//! `#` ends suppression, so a replaced directive swallows everything up
//! to the next comment line.

use crate::miner::BinaryArguments;
use crate::template::devices::{CommentBlockParser, DeviceBlockParser, ParsedDeviceConfigEntry};
use crate::template::remove_stale;
use crate::utils::error::MinerError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const CONNECTION_PREFIX: &str = "<Connection";
const GLOBAL_PREFIX: &str = "<Global";
const CL_DEVICE_PREFIX: &str = "<CL_Device";
const DEVICE_BLOCK_MARKERS: [&str; 2] = ["OpenCL device config", "CUDA Device config"];
const DEVICE_BLOCK_END: &str = "#-#-#-#-#-#-#-#-#-#-#-";

lazy_static! {
    static ref DEVICE_INDEX_RE: Regex =
        Regex::new(r#"(?i)DeviceIndex\s*=\s*"?(\d+)"?"#).expect("valid regex");
}

/// Output suppression state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Lines are copied through
    Normal,
    /// A directive was replaced or a device dropped; skip until a `#` line
    SuppressingAfterReplacement,
}

/// Device config block scanning state
#[derive(Debug, PartialEq, Eq)]
enum DeviceBlockState {
    Outside,
    /// Lines seen since the block marker
    Inside(String),
}

/// Failure while rewriting, split by which side of the copy failed
#[derive(Error, Debug)]
pub enum RewriteError {
    /// Reading the template failed
    #[error("template read failed: {0}")]
    Read(#[source] io::Error),
    /// Writing the final config failed
    #[error("config write failed: {0}")]
    Write(#[source] io::Error),
}

/// Rewrites a vendor template into the final miner config
pub struct TemplateRewriter<'a, P: DeviceBlockParser = CommentBlockParser> {
    args: &'a BinaryArguments,
    data_file: &'a Path,
    parser: P,
    state: LineState,
    block: DeviceBlockState,
    devices: BTreeMap<u32, ParsedDeviceConfigEntry>,
}

impl<'a> TemplateRewriter<'a> {
    /// Creates a rewriter using the standard device block parser
    ///
    /// # Arguments
    /// * `args` - Connection and device options to write
    /// * `data_file` - Path of the verthash data file the miner should use
    pub fn new(args: &'a BinaryArguments, data_file: &'a Path) -> Self {
        Self::with_parser(args, data_file, CommentBlockParser)
    }
}

impl<'a, P: DeviceBlockParser> TemplateRewriter<'a, P> {
    /// Creates a rewriter with a custom device block parser
    pub fn with_parser(args: &'a BinaryArguments, data_file: &'a Path, parser: P) -> Self {
        TemplateRewriter {
            args,
            data_file,
            parser,
            state: LineState::Normal,
            block: DeviceBlockState::Outside,
            devices: BTreeMap::new(),
        }
    }

    /// Copies `input` to `output`, rewriting directives along the way
    ///
    /// Stops at the first read or write failure.
    pub fn rewrite<R: BufRead, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
    ) -> Result<(), RewriteError> {
        for line in input.lines() {
            let line = line.map_err(RewriteError::Read)?;
            self.process_line(&line, output)
                .map_err(RewriteError::Write)?;
        }
        Ok(())
    }

    fn process_line<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<()> {
        if line.starts_with('#') {
            self.state = LineState::Normal;
        }

        if line.starts_with(CONNECTION_PREFIX) {
            output.write_all(self.connection_directive().as_bytes())?;
            self.state = LineState::SuppressingAfterReplacement;
        }

        if line.starts_with(GLOBAL_PREFIX) {
            output.write_all(self.global_directive().as_bytes())?;
            self.state = LineState::SuppressingAfterReplacement;
        }

        self.track_device_block(line);

        if line.starts_with(CL_DEVICE_PREFIX) && self.is_excluded_device(line) {
            log::debug!("Intel disabled, dropping {}", line);
            self.state = LineState::SuppressingAfterReplacement;
        }

        if self.state == LineState::Normal {
            output.write_all(line.as_bytes())?;
            output.write_all(b"\n")?;
        }
        Ok(())
    }

    fn track_device_block(&mut self, line: &str) {
        if DEVICE_BLOCK_MARKERS.iter().any(|m| line.contains(m)) {
            if self.block == DeviceBlockState::Outside {
                log::debug!("Entering device block");
                self.block = DeviceBlockState::Inside(String::new());
            }
        } else if let DeviceBlockState::Inside(buffer) = &mut self.block {
            buffer.push_str(line);
            buffer.push('\n');
        }

        if line.contains(DEVICE_BLOCK_END) {
            if let DeviceBlockState::Inside(buffer) =
                std::mem::replace(&mut self.block, DeviceBlockState::Outside)
            {
                self.devices = self.parser.parse(&buffer);
                log::debug!("Exiting device block, {} devices parsed", self.devices.len());
            }
        }
    }

    fn is_excluded_device(&self, line: &str) -> bool {
        if self.args.enable_integrated {
            return false;
        }
        device_index(line)
            .and_then(|index| self.devices.get(&index))
            .is_some_and(ParsedDeviceConfigEntry::is_intel)
    }

    fn connection_directive(&self) -> String {
        format!(
            "<Connection Url = \"{}\"\n\tUsername = \"{}\"\n\tPassword = \"{}\"\n\tAlgorithm = \"Verthash\">\n\n",
            self.args.stratum_url, self.args.stratum_username, self.args.stratum_password
        )
    }

    fn global_directive(&self) -> String {
        format!(
            "<Global Debug=\"false\" VerthashDataFileVerification=\"false\" VerthashDataFile=\"{}\">\n\n",
            self.data_file.display()
        )
    }
}

/// Reads the `DeviceIndex = N` attribute of a device declaration line
pub fn device_index(line: &str) -> Option<u32> {
    DEVICE_INDEX_RE
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

/// Writes the final config at `config_path` from the template at `template_path`
///
/// Any existing file at `config_path` is removed first.
///
/// # Errors
/// - `TemplateError` if the template cannot be opened or read
/// - `ConfigWriteError` if the final config cannot be created or written
pub fn synthesize_config(
    template_path: &Path,
    config_path: &Path,
    args: &BinaryArguments,
    data_file: &Path,
) -> Result<(), MinerError> {
    let template_err = |source| MinerError::TemplateError {
        path: template_path.to_path_buf(),
        source,
    };
    let write_err = |source| MinerError::ConfigWriteError {
        path: config_path.to_path_buf(),
        source,
    };

    let input = File::open(template_path).map_err(template_err)?;

    remove_stale(config_path);
    let file = File::create(config_path).map_err(write_err)?;
    let mut output = BufWriter::new(file);

    TemplateRewriter::new(args, data_file)
        .rewrite(BufReader::new(input), &mut output)
        .map_err(|e| match e {
            RewriteError::Read(source) => template_err(source),
            RewriteError::Write(source) => write_err(source),
        })?;

    output.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEMPLATE: &str = "\
# VerthashMiner configuration
#
<Connection Url = \"stratum+tcp://example.org:3333\"
\tUsername = \"user\"
\tPassword = \"pass\"
\tAlgorithm = \"Verthash\">

#-------------------------------------------------
<Global Debug=\"true\" VerthashDataFileVerification=\"true\" VerthashDataFile=\"verthash.dat\">

#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
# OpenCL device config:
#
# 1. Device: Intel(R) UHD Graphics 630
#    Platform: Intel(R) OpenCL HD Graphics
#    DeviceIndex: 0
#
# 2. Device: Radeon RX 580
#    Platform: AMD Accelerated Parallel Processing
#    DeviceIndex: 1
#
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
<CL_Device0 DeviceIndex = 0 WorkSize = 131072>
<CL_Device1 DeviceIndex = 1 WorkSize = 131072>
# end
";

    fn args(enable_integrated: bool) -> BinaryArguments {
        BinaryArguments {
            stratum_url: "stratum+tcp://pool.woolypooly.com:3102".to_string(),
            stratum_username: "Vabc".to_string(),
            stratum_password: "x".to_string(),
            enable_integrated,
        }
    }

    fn rewrite(template: &str, enable_integrated: bool) -> String {
        let args = args(enable_integrated);
        let data_file = Path::new("/data/verthash.dat");
        let mut out = Vec::new();
        TemplateRewriter::new(&args, data_file)
            .rewrite(Cursor::new(template), &mut out)
            .expect("rewrite in memory");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn test_connection_and_global_replaced() {
        let out = rewrite(TEMPLATE, true);

        assert!(out.contains(
            "<Connection Url = \"stratum+tcp://pool.woolypooly.com:3102\"\n\tUsername = \"Vabc\"\n\tPassword = \"x\"\n\tAlgorithm = \"Verthash\">\n\n"
        ));
        assert!(out.contains(
            "<Global Debug=\"false\" VerthashDataFileVerification=\"false\" VerthashDataFile=\"/data/verthash.dat\">\n\n"
        ));
        assert!(!out.contains("example.org"), "original connection body must be suppressed");
        assert!(!out.contains("Username = \"user\""));
        assert!(!out.contains("Debug=\"true\""));
    }

    #[test]
    fn test_comments_and_block_copied() {
        let out = rewrite(TEMPLATE, true);
        assert!(out.starts_with("# VerthashMiner configuration\n#\n"));
        assert!(out.contains("#-------------------------------------------------\n"));
        assert!(out.contains("#    Platform: Intel(R) OpenCL HD Graphics\n"));
        assert!(out.ends_with("# end\n"));
    }

    #[test]
    fn test_intel_device_dropped_when_integrated_disallowed() {
        let out = rewrite(TEMPLATE, false);
        assert!(!out.contains("<CL_Device0"));
        // Suppression continues until the next comment line
        assert!(!out.contains("<CL_Device1"));
        assert!(out.ends_with("# end\n"));
    }

    #[test]
    fn test_intel_device_kept_when_integrated_allowed() {
        let out = rewrite(TEMPLATE, true);
        assert!(out.contains("<CL_Device0 DeviceIndex = 0 WorkSize = 131072>\n"));
        assert!(out.contains("<CL_Device1 DeviceIndex = 1 WorkSize = 131072>\n"));
    }

    #[test]
    fn test_non_intel_device_kept_when_integrated_disallowed() {
        let template = "\
# OpenCL device config:
#    Platform: AMD Accelerated Parallel Processing
#    DeviceIndex: 0
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
<CL_Device0 DeviceIndex = 0 WorkSize = 131072>
";
        let out = rewrite(template, false);
        assert!(out.contains("<CL_Device0 DeviceIndex = 0 WorkSize = 131072>\n"));
    }

    #[test]
    fn test_unknown_device_index_is_kept() {
        let out = rewrite("<CL_Device5 DeviceIndex = 5>\n", false);
        assert_eq!(out, "<CL_Device5 DeviceIndex = 5>\n");
    }

    #[test]
    fn test_device_index_attribute() {
        assert_eq!(device_index("<CL_Device0 DeviceIndex = 0 WorkSize = 131072>"), Some(0));
        assert_eq!(device_index("<CL_Device DeviceIndex = \"12\">"), Some(12));
        assert_eq!(device_index("<CL_Device WorkSize = 131072>"), None);
    }

    #[test]
    fn test_synthesize_config_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let template_path = dir.path().join("verthash-miner-tmpl.conf");
        let config_path = dir.path().join("verthash-miner.conf");
        std::fs::write(&template_path, TEMPLATE).expect("write template");
        std::fs::write(&config_path, "stale content\n").expect("write stale config");

        let data_file = dir.path().join("verthash.dat");
        synthesize_config(&template_path, &config_path, &args(false), &data_file)
            .expect("synthesize");

        let out = std::fs::read_to_string(&config_path).expect("read config");
        assert!(!out.contains("stale content"));
        assert!(out.contains(&format!("VerthashDataFile=\"{}\"", data_file.display())));
    }

    #[test]
    fn test_missing_template_is_template_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = synthesize_config(
            &dir.path().join("missing.conf"),
            &dir.path().join("out.conf"),
            &args(false),
            Path::new("verthash.dat"),
        );
        assert!(matches!(result, Err(MinerError::TemplateError { .. })));
    }

    #[test]
    fn test_unwritable_config_is_write_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let template_path = dir.path().join("tmpl.conf");
        std::fs::write(&template_path, TEMPLATE).expect("write template");

        let result = synthesize_config(
            &template_path,
            &dir.path().join("no-such-dir").join("out.conf"),
            &args(false),
            Path::new("verthash.dat"),
        );
        assert!(matches!(result, Err(MinerError::ConfigWriteError { .. })));
    }

    #[test]
    fn test_later_device_block_is_used() {
        let template = "\
# CUDA Device config:
#    Device: GeForce GTX 1070
#    Platform: NVIDIA CUDA
#    DeviceIndex: 1
#
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
<CU_Device0 DeviceIndex = 1>
# OpenCL device config:
#    Device: Intel(R) UHD Graphics 630
#    Platform: Intel(R) OpenCL HD Graphics
#    DeviceIndex: 0
#
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
<CL_Device0 DeviceIndex = 0 WorkSize = 131072>
# end
";
        let out = rewrite(template, false);
        assert!(out.contains("#    Platform: NVIDIA CUDA\n"));
        assert!(out.contains("<CU_Device0 DeviceIndex = 1>\n"));
        assert!(!out.contains("<CL_Device0"));
        assert!(out.ends_with("# end\n"));
    }

    #[test]
    fn test_later_device_block_replaces_earlier_entries() {
        let template = "\
# OpenCL device config:
#    Platform: Intel(R) OpenCL HD Graphics
#    DeviceIndex: 0
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
# CUDA Device config:
#    Platform: NVIDIA CUDA
#    DeviceIndex: 0
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
<CL_Device0 DeviceIndex = 0 WorkSize = 131072>
";
        let out = rewrite(template, false);
        assert!(out.contains("<CL_Device0 DeviceIndex = 0 WorkSize = 131072>\n"));
    }

    /// Reports every block as a single Intel device at index 2
    struct IntelAtTwo;

    impl DeviceBlockParser for IntelAtTwo {
        fn parse(&self, _block: &str) -> BTreeMap<u32, ParsedDeviceConfigEntry> {
            let entry = ParsedDeviceConfigEntry {
                index: 2,
                platform: "Intel(R) OpenCL".to_string(),
                ..Default::default()
            };
            BTreeMap::from([(2, entry)])
        }
    }

    #[test]
    fn test_custom_device_block_parser() {
        let template = "\
# OpenCL device config:
#-#-#-#-#-#-#-#-#-#-#-#-#-#-#
<CL_Device0 DeviceIndex = 0>
# next
<CL_Device2 DeviceIndex = 2>
# end
";
        let args = args(false);
        let mut out = Vec::new();
        TemplateRewriter::with_parser(&args, Path::new("verthash.dat"), IntelAtTwo)
            .rewrite(Cursor::new(template), &mut out)
            .expect("rewrite in memory");
        let out = String::from_utf8(out).expect("utf8 output");

        assert!(out.contains("<CL_Device0 DeviceIndex = 0>\n"));
        assert!(!out.contains("<CL_Device2"));
        assert!(out.ends_with("# end\n"));
    }

    #[test]
    fn test_rewrite_error_messages() {
        let err = RewriteError::Write(io::Error::other("disk full"));
        assert_eq!(err.to_string(), "config write failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
    }
}
