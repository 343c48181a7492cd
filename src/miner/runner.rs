// src/miner/runner.rs
//! Miner binary invocation
//!
//! [`BinaryRunner`] is the seam between the driver and the child process.
//! [`ProcessRunner`] implements it on top of `std::process`, forwarding
//! stdout line by line through a channel while the process runs. The
//! miner's stderr is logged at debug level.

use crate::utils::error::MinerError;
use crossbeam_channel::Sender;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

/// How a finished miner process exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code for error reporting, `-1` when killed by a signal
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Launches the miner binary and waits for it
///
/// One process at a time: `wait` refers to the most recent `launch`.
pub trait BinaryRunner: Send {
    /// Starts the binary with `args`
    ///
    /// With `forward_output` set, each stdout line is delivered to the
    /// runner's output sink in the order it was printed.
    fn launch(&mut self, args: &[String], forward_output: bool) -> Result<(), MinerError>;

    /// Blocks until the launched process exits
    ///
    /// No timeout: a hung process blocks the caller.
    fn wait(&mut self) -> Result<ExitOutcome, MinerError>;
}

/// [`BinaryRunner`] backed by a real child process
pub struct ProcessRunner {
    /// Path to the miner executable
    binary: PathBuf,
    /// Receives stdout lines of launches with `forward_output`
    output: Option<Sender<String>>,
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
}

impl ProcessRunner {
    /// Creates a runner for the executable at `binary`
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        ProcessRunner {
            binary: binary.into(),
            output: None,
            child: None,
            readers: Vec::new(),
        }
    }

    /// Sets the channel that receives forwarded stdout lines
    pub fn with_output(mut self, output: Sender<String>) -> Self {
        self.output = Some(output);
        self
    }

    /// Drops the output sink so listeners see the channel disconnect
    /// once the current process's reader finishes
    pub fn close_output(&mut self) {
        self.output = None;
    }

    /// Kills the running process, if any
    ///
    /// The process still has to be reaped with [`BinaryRunner::wait`].
    pub fn kill(&mut self) -> Result<(), MinerError> {
        if let Some(child) = self.child.as_mut() {
            child
                .kill()
                .map_err(|e| MinerError::ProcessError(format!("Failed to kill miner: {}", e)))?;
        }
        Ok(())
    }
}

impl BinaryRunner for ProcessRunner {
    fn launch(&mut self, args: &[String], forward_output: bool) -> Result<(), MinerError> {
        log::debug!("Launching {} {:?}", self.binary.display(), args);

        let sink = self.output.clone().filter(|_| forward_output);
        let stdout = if sink.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                MinerError::ProcessError(format!(
                    "Failed to launch {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if let (Some(sink), Some(stdout)) = (sink, child.stdout.take()) {
            self.readers.push(std::thread::spawn(move || {
                // Keep draining after the receiver goes away so the miner
                // never writes into a closed pipe
                let mut forwarding = true;
                read_lines(stdout, |line| {
                    if forwarding && sink.send(line).is_err() {
                        forwarding = false;
                    }
                });
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            self.readers.push(std::thread::spawn(move || {
                read_lines(stderr, |line| log::debug!("miner stderr: {}", line));
            }));
        }

        self.child = Some(child);
        Ok(())
    }

    fn wait(&mut self) -> Result<ExitOutcome, MinerError> {
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MinerError::ProcessError("No miner process launched".into()))?;

        let status = child
            .wait()
            .map_err(|e| MinerError::ProcessError(format!("Failed to wait for miner: {}", e)))?;

        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                log::error!("Miner output reader panicked");
            }
        }

        Ok(ExitOutcome {
            code: status.code(),
        })
    }
}

impl Drop for ProcessRunner {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.kill().and_then(|_| self.wait()) {
                log::warn!("Failed to stop miner: {}", e);
            }
        }
    }
}

/// Calls `on_line` for every line of `input` until EOF
///
/// Line endings (`\n` or `\r\n`) are stripped and invalid UTF-8 is
/// replaced, so odd bytes never end the stream.
fn read_lines<R: Read>(input: R, mut on_line: impl FnMut(String)) {
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                on_line(String::from_utf8_lossy(&buf).into_owned());
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("Stopped reading miner output: {}", e);
                break;
            }
        }
    }
}
