// src/main.rs
use clap::Parser;
use crossbeam_channel::unbounded;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use verthash_driver_rs::miner::{BinaryRunner, MinerImpl, ProcessRunner, VerthashMiner};
use verthash_driver_rs::stats::{self, HashRateTable, OutputInterpreter, StatsReporter};
use verthash_driver_rs::{MinerError, cli, config, init_logging};

/// Main entry point for the miner driver
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Start(opts) => start_mining(opts),
        cli::Action::Gpus(opts) => detect_gpus(opts),
        cli::Action::Config(opts) => generate_config(opts),
        cli::Action::Replay(opts) => replay_log(opts),
    }
}

/// Configures and runs the miner until it exits
///
/// # Operations
/// 1. Loads configuration and initializes logging
/// 2. Writes the miner config from the miner's own template
/// 3. Starts the output listener and stats reporter
/// 4. Runs the miner with the generated config
/// 5. Fails if the miner exits unsuccessfully
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    let config = config::load(&opts.config)?;
    let debug = opts.debug || config.miner.debug;
    init_logging(debug);

    let args = config.binary_arguments()?;
    std::fs::create_dir_all(&config.miner.data_dir)?;

    // Miner stdout, one message per line
    let (line_sender, line_receiver) = unbounded();
    let runner = ProcessRunner::new(&config.miner.binary).with_output(line_sender);
    let mut miner = VerthashMiner::new(runner, &config.miner.data_dir, debug);

    miner.configure(&args)?;

    let listener = miner.spawn_output_listener(line_receiver);
    let reporter = StatsReporter::new(miner.table(), config.report_interval());
    let reporting = reporter.start_reporting();

    let launch_args = miner.construct_command_line_args(&args);
    log::info!("Starting miner with {:?}", launch_args);
    let outcome = miner
        .runner_mut()
        .launch(&launch_args, true)
        .and_then(|_| miner.runner_mut().wait());

    // Closing our end lets the listener drain and finish
    miner.runner_mut().close_output();
    if listener.join().is_err() {
        log::error!("Output listener panicked");
    }
    reporter.stop();
    let _ = reporting.join();

    let outcome = outcome?;
    let final_stats = reporter.get_stats();
    log::info!(
        "Miner exited with code {} | Last hashrate: {}",
        outcome.exit_code(),
        final_stats.hash_rate_str
    );

    if !outcome.success() {
        return Err(MinerError::ProcessError(format!(
            "Miner exited with code {}",
            outcome.exit_code()
        )));
    }
    Ok(())
}

/// Prints the number of GPUs the miner detects
fn detect_gpus(opts: cli::GpusOptions) -> Result<(), MinerError> {
    let config = config::load(&opts.config)?;
    init_logging(config.miner.debug);
    std::fs::create_dir_all(&config.miner.data_dir)?;

    let runner = ProcessRunner::new(&config.miner.binary);
    let mut miner = VerthashMiner::new(runner, &config.miner.data_dir, config.miner.debug);

    println!("{}", miner.available_gpus());
    Ok(())
}

/// Generates driver configuration template file
///
/// # Arguments
/// * `opts` - Configuration generation options
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let config = config::generate_template(opts.pool);
    std::fs::write(opts.output, config)?;
    Ok(())
}

/// Feeds a captured miner log through the interpreter
///
/// # Arguments
/// * `opts` - Log file and output format
fn replay_log(opts: cli::ReplayOptions) -> Result<(), MinerError> {
    init_logging(false);

    let interpreter = OutputInterpreter::new(Arc::new(HashRateTable::new()), false);
    for line in BufReader::new(File::open(&opts.input)?).lines() {
        interpreter.parse_output(&line?);
    }

    let table = interpreter.table();
    let devices = table.devices();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else {
        for device in &devices {
            println!(
                "{:<6} {:>2}  {:<32} {}",
                device.device_type.to_string(),
                device.device_id,
                device.device_name,
                device.hash_rate_str
            );
        }
        println!("Total: {}", stats::format_hash_rate(table.hash_rate()));
    }
    Ok(())
}
