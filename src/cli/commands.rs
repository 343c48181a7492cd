// src/cli/commands.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Verthash miner driver - runs VerthashMiner and reports its hashrate
#[derive(Parser, Debug)]
#[command(name = "verthash-driver")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the driver
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Configure and run the miner, reporting hashrate while it runs
    Start(StartOptions),

    /// Print how many GPUs the miner detects
    Gpus(GpusOptions),

    /// Generate driver configuration file template
    Config(ConfigOptions),

    /// Interpret a captured miner log and print the device table
    Replay(ReplayOptions),
}

/// Options for running the miner
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to driver configuration file
    #[arg(short, long, default_value = "driver.toml")]
    pub config: PathBuf,

    /// Log every miner output line (overrides config)
    #[arg(short, long)]
    pub debug: bool,
}

/// Options for GPU detection
#[derive(Parser, Debug)]
pub struct GpusOptions {
    /// Path to driver configuration file
    #[arg(short, long, default_value = "driver.toml")]
    pub config: PathBuf,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "driver.toml")]
    pub output: PathBuf,

    /// Use a pool preset instead of explicit stratum settings
    #[arg(short, long)]
    pub pool: bool,
}

/// Options for replaying a captured miner log
#[derive(Parser, Debug)]
pub struct ReplayOptions {
    /// Captured miner output, one line per status message
    #[arg(short, long)]
    pub input: PathBuf,

    /// Print the device table as JSON
    #[arg(short, long)]
    pub json: bool,
}
