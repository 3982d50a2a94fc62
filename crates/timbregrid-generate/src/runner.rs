//! Running external tools.
//!
//! [`ToolRunner`] is the seam between the orchestrator and the operating system:
//! production code uses [`ProcessRunner`], tests substitute an in-process fake.

use crate::error::{GenerationError, Result};
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use timbregrid_core::ExternalToolInvocation;

/// How an external tool run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Success,
    ExitCode(i32),
    /// Terminated by a signal.
    Terminated,
    /// Killed after exceeding its time limit.
    TimedOut(Duration),
    /// The runner could not start or wait on the tool.
    NotRun,
    /// The worker thread driving the tool panicked.
    Panicked,
}

impl ToolStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolStatus::Success)
    }

    pub fn from_exit(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(0) => ToolStatus::Success,
            Some(code) => ToolStatus::ExitCode(code),
            None => ToolStatus::Terminated,
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStatus::Success => write!(f, "succeeded"),
            ToolStatus::ExitCode(code) => write!(f, "exited with code {}", code),
            ToolStatus::Terminated => write!(f, "was terminated by a signal"),
            ToolStatus::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            ToolStatus::NotRun => write!(f, "could not be run"),
            ToolStatus::Panicked => write!(f, "panicked"),
        }
    }
}

/// Runs one invocation to completion, blocking the calling thread.
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        invocation: &ExternalToolInvocation,
        timeout: Option<Duration>,
    ) -> Result<ToolStatus>;
}

/// Spawns the invocation as a child process.
///
/// With a timeout the child is polled and killed once the limit passes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    poll_interval: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// How often a running child is checked against its timeout.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(
        &self,
        invocation: &ExternalToolInvocation,
        timeout: Option<Duration>,
    ) -> Result<ToolStatus> {
        tracing::debug!("Running: {}", invocation);

        let mut command = invocation.to_command();
        let mut child = command
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| GenerationError::Spawn {
                program: invocation.program().display().to_string(),
                source,
            })?;

        let Some(limit) = timeout else {
            return Ok(ToolStatus::from_exit(child.wait()?));
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(ToolStatus::from_exit(status));
            }
            if started.elapsed() >= limit {
                tracing::warn!(
                    "{} exceeded {:?}, killing pid {}",
                    invocation.program().display(),
                    limit,
                    child.id()
                );
                // The child may exit between try_wait and kill.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ToolStatus::TimedOut(limit));
            }
            std::thread::sleep(self.poll_interval.min(limit));
        }
    }
}
