//! External tool invocation behind a testable capability seam.
//!
//! Corpus preparation shells out to `arecord` and `ffmpeg`. The
//! [`ToolRunner`] trait wraps that boundary so the wrappers above it
//! can be tested without the binaries installed, and every invocation
//! carries a hard deadline since a hung recorder would otherwise stall
//! the whole harness.

pub mod capture;
pub mod clips;

use std::io::ErrorKind;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{DiabenchError, Result};

/// How often a running tool is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Trait for running external tools to completion.
///
/// Object-safe, Send + Sync for use behind generic wrappers.
pub trait ToolRunner: Send + Sync {
    /// Runs the program with arguments, returning its stdout.
    ///
    /// The tool is killed once `timeout` elapses.
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String>;
}

/// Production runner using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    DiabenchError::ToolNotFound {
                        tool: program.to_string(),
                    }
                } else {
                    DiabenchError::ToolFailed {
                        tool: program.to_string(),
                        message: format!("failed to start: {e}"),
                    }
                }
            })?;

        // Output is read only after exit; tools are invoked with quiet
        // flags so the pipes stay below capacity while polling.
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if started.elapsed() >= timeout {
                        child.kill().ok();
                        child.wait().ok();
                        return Err(DiabenchError::ToolTimeout {
                            tool: program.to_string(),
                            timeout_secs: timeout.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(DiabenchError::ToolFailed {
                        tool: program.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| DiabenchError::ToolFailed {
                tool: program.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiabenchError::ToolFailed {
                tool: program.to_string(),
                message: format!("{:?}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Mock tool runner for testing.
///
/// Records every invocation and returns configured responses in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockToolRunner {
    calls: std::sync::Mutex<Vec<RecordedCall>>,
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String>>>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

#[cfg(test)]
impl MockToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a successful response to the queue.
    pub fn with_response(self, stdout: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(stdout.to_string()));
        self
    }

    /// Add an error response to the queue.
    pub fn with_failure(self, error: DiabenchError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Get a specific call by index.
    pub fn call(&self, index: usize) -> Option<RecordedCall> {
        self.calls.lock().unwrap().get(index).cloned()
    }
}

#[cfg(test)]
impl ToolRunner for MockToolRunner {
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout,
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}
