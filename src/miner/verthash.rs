// src/miner/verthash.rs
//! VerthashMiner driver
//!
//! Ties config synthesis and output interpretation to one miner binary
//! and one data directory. Files used inside the data directory:
//! - `verthash-miner-tmpl.conf`: template dumped by `--gen-conf`
//! - `verthash-miner.conf`: final config passed with `--conf`
//! - `verthash-miner-tmp.conf`: throwaway dump used to count GPUs
//! - `verthash.dat`: verthash data file referenced by the final config

use crate::miner::runner::{BinaryRunner, ExitOutcome};
use crate::miner::{BinaryArguments, MinerImpl};
use crate::stats::{HashRateTable, OutputInterpreter};
use crate::template::{self, remove_stale};
use crate::types::DeviceInfo;
use crate::utils::error::MinerError;
use crossbeam_channel::Receiver;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Template dumped by the miner
pub const TEMPLATE_CONFIG_FILE: &str = "verthash-miner-tmpl.conf";
/// Final config the miner runs with
pub const CONFIG_FILE: &str = "verthash-miner.conf";
/// Throwaway template used for GPU detection
pub const PROBE_CONFIG_FILE: &str = "verthash-miner-tmp.conf";
/// Verthash data file
pub const DATA_FILE: &str = "verthash.dat";

/// Driver for the VerthashMiner binary
pub struct VerthashMiner<R: BinaryRunner> {
    /// Runs the miner binary
    runner: R,
    /// Directory holding configs and the data file
    data_dir: PathBuf,
    /// Feeds the shared hashrate table
    interpreter: OutputInterpreter,
}

impl<R: BinaryRunner> VerthashMiner<R> {
    /// Creates a driver
    ///
    /// # Arguments
    /// * `runner` - Runner for the miner binary
    /// * `data_dir` - Directory for config files and `verthash.dat`
    /// * `debug` - Echo every miner output line to the debug log
    pub fn new(runner: R, data_dir: impl Into<PathBuf>, debug: bool) -> Self {
        VerthashMiner {
            runner,
            data_dir: data_dir.into(),
            interpreter: OutputInterpreter::new(Arc::new(HashRateTable::new()), debug),
        }
    }

    /// Path of the template dumped by the miner
    pub fn template_path(&self) -> PathBuf {
        self.data_dir.join(TEMPLATE_CONFIG_FILE)
    }

    /// Path of the final config
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Path of the verthash data file
    pub fn data_file_path(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE)
    }

    /// Shared hashrate table, for readers on other threads
    pub fn table(&self) -> Arc<HashRateTable> {
        self.interpreter.table().clone()
    }

    /// Mutable access to the runner, e.g. to launch the configured miner
    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Feeds every line from `lines` to the interpreter on a new thread
    ///
    /// The thread ends once all senders of `lines` are dropped.
    pub fn spawn_output_listener(&self, lines: Receiver<String>) -> JoinHandle<()> {
        let interpreter = self.interpreter.clone();

        std::thread::spawn(move || {
            for line in lines {
                interpreter.parse_output(&line);
            }
        })
    }

    /// Has the miner dump its default config to `path`
    fn dump_template(&mut self, path: &Path) -> Result<ExitOutcome, MinerError> {
        remove_stale(path);
        self.runner
            .launch(&gen_conf_args(path), false)?;
        self.runner.wait()
    }

    fn count_gpus(&mut self, path: &Path) -> Result<usize, MinerError> {
        let outcome = self.dump_template(path)?;
        if !outcome.success() {
            return Err(MinerError::ConfigGenerationError(outcome.exit_code()));
        }

        let input = File::open(path).map_err(|source| MinerError::TemplateError {
            path: path.to_path_buf(),
            source,
        })?;
        let count = template::count_device_declarations(BufReader::new(input));
        remove_stale(path);

        count.map_err(|source| MinerError::TemplateError {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<R: BinaryRunner> MinerImpl for VerthashMiner<R> {
    fn configure(&mut self, args: &BinaryArguments) -> Result<(), MinerError> {
        let template_path = self.template_path();
        let outcome = self.dump_template(&template_path)?;
        if !outcome.success() {
            return Err(MinerError::ConfigGenerationError(outcome.exit_code()));
        }

        let config_path = self.config_path();
        template::synthesize_config(&template_path, &config_path, args, &self.data_file_path())?;
        log::info!("Wrote miner config to {}", config_path.display());
        Ok(())
    }

    fn parse_output(&self, line: &str) {
        self.interpreter.parse_output(line);
    }

    fn hash_rate(&self) -> u64 {
        self.interpreter.table().hash_rate()
    }

    fn construct_command_line_args(&self, _args: &BinaryArguments) -> Vec<String> {
        vec![
            "--conf".to_string(),
            self.config_path().display().to_string(),
        ]
    }

    fn available_gpus(&mut self) -> u8 {
        log::debug!("AvailableGPUs called");
        let probe_path = self.data_dir.join(PROBE_CONFIG_FILE);

        match self.count_gpus(&probe_path) {
            Ok(count) => u8::try_from(count).unwrap_or(u8::MAX),
            Err(e) => {
                log::error!("GPU detection failed: {}", e);
                0
            }
        }
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        self.interpreter.table().devices()
    }
}

fn gen_conf_args(path: &Path) -> Vec<String> {
    vec!["--gen-conf".to_string(), path.display().to_string()]
}
