//! Predictor backed by a long-lived child process.
//!
//! # Protocol
//!
//! Newline-delimited JSON over the child's stdin and stdout:
//! - Request: one line holding the decoded input
//! - Response: one line holding the prediction, or `{"error": "..."}`
//!
//! The child's stderr is inherited so model logs reach the operator. If the
//! child dies or the pipe breaks, the failing request errors and the next
//! request spawns a fresh child.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{anyhow, bail, Context};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::port::outbound::predictor::Predictor;

pub const KIND: &str = "process";

/// Runs inference in an external program, one request at a time.
pub struct ProcessPredictor {
    name: String,
    major_version: u32,
    minor_version: u32,
    program: String,
    args: Vec<String>,
    worker: Mutex<Option<Worker>>,
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    fn spawn(program: &str, args: &[String]) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(std::io::Error::other("child pipes unavailable"));
        };

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn exchange(&mut self, request: &[u8]) -> anyhow::Result<String> {
        self.stdin
            .write_all(request)
            .and_then(|()| self.stdin.write_all(b"\n"))
            .and_then(|()| self.stdin.flush())
            .context("failed to write request to worker")?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .context("failed to read response from worker")?;
        if read == 0 {
            bail!("worker closed its output");
        }
        Ok(line)
    }

    fn shutdown(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl ProcessPredictor {
    /// Spawn the worker process.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started.
    pub fn spawn(
        name: impl Into<String>,
        major_version: u32,
        minor_version: u32,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> std::io::Result<Self> {
        let name = name.into();
        let program = program.into();
        let worker = Worker::spawn(&program, &args)?;
        info!(model = %name, program = %program, pid = worker.child.id(), "Predictor worker spawned");

        Ok(Self {
            name,
            major_version,
            minor_version,
            program,
            args,
            worker: Mutex::new(Some(worker)),
        })
    }
}

impl Predictor for ProcessPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn major_version(&self) -> u32 {
        self.major_version
    }

    fn minor_version(&self) -> u32 {
        self.minor_version
    }

    fn predict(&self, input: Value) -> anyhow::Result<Value> {
        let request = serde_json::to_vec(&input).context("failed to encode request")?;

        let mut slot = self.worker.lock();
        let mut worker = match slot.take() {
            Some(worker) => worker,
            None => {
                let worker = Worker::spawn(&self.program, &self.args)
                    .with_context(|| format!("failed to restart worker '{}'", self.program))?;
                debug!(model = %self.name, pid = worker.child.id(), "Predictor worker restarted");
                worker
            }
        };

        let line = match worker.exchange(&request) {
            Ok(line) => {
                *slot = Some(worker);
                line
            }
            Err(e) => {
                warn!(model = %self.name, error = %e, "Predictor worker failed, restarting on next request");
                worker.shutdown();
                return Err(e);
            }
        };
        drop(slot);

        let response: Value =
            serde_json::from_str(line.trim_end()).context("worker returned invalid JSON")?;
        if let Some(message) = error_response(&response) {
            return Err(anyhow!("{message}"));
        }
        Ok(response)
    }
}

impl Drop for ProcessPredictor {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.shutdown();
        }
    }
}

/// `{"error": ...}` with no other keys.
fn error_response(response: &Value) -> Option<String> {
    let object = response.as_object()?;
    if object.len() != 1 {
        return None;
    }
    match object.get("error")? {
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
