// src/utils/logging.rs
//! Logging configuration
//!
//! Sets up `env_logger` with the driver's line format. Miner output
//! passthrough and parse diagnostics are logged at debug level, so
//! `debug` mode lowers the default filter accordingly.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes the logging subsystem
///
/// # Configuration
/// - Logs to stdout
/// - Default log level: Info, or Debug when `debug` is set
/// - Respects `RUST_LOG` environment variable if set
pub fn init_logging(debug: bool) {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(if debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    } else {
        builder.parse_env("RUST_LOG");
    }

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = builder.try_init();
}

/// Creates a base logger builder with the common line format
///
/// Format: `[<epoch seconds> <level> <module>:<line>] <message>`
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stdout);

    builder
}
