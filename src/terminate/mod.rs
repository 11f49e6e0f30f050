//! Terminate a process by PID and classify what happened.
//! One shot per user request; never retried.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod win32;

use crate::config::TerminationConfig;
use crate::error::TerminationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[cfg(unix)]
pub use unix::SystemTerminator;
#[cfg(windows)]
pub use win32::SystemTerminator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// Request delivered and the process went away within the grace period
    Exited,
    /// Request delivered but the process was still alive when the grace period ended
    Signalled,
    /// Nothing to terminate; the desired end state already holds
    NotFound,
    PermissionDenied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationResult {
    pub pid: u32,
    pub outcome: TerminationOutcome,
}

impl TerminationResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            TerminationOutcome::Exited
                | TerminationOutcome::Signalled
                | TerminationOutcome::NotFound
        )
    }

    /// Human-readable line for the display layer.
    pub fn describe(&self) -> String {
        match &self.outcome {
            TerminationOutcome::Exited => format!("process {} terminated", self.pid),
            TerminationOutcome::Signalled => {
                format!("process {} was asked to terminate but is still running", self.pid)
            }
            TerminationOutcome::NotFound => format!("process {} no longer exists", self.pid),
            TerminationOutcome::PermissionDenied => {
                format!("permission denied terminating process {}", self.pid)
            }
            TerminationOutcome::Failed(reason) => {
                format!("could not terminate process {}: {}", self.pid, reason)
            }
        }
    }
}

/// Platform capability to end a process.
pub trait ProcessTerminator: Send + Sync {
    fn send_terminate(&self, pid: u32) -> Result<(), TerminationError>;

    /// Block until `pid` is gone or `grace` elapses. Returns true if it is gone.
    fn wait_exit(&self, pid: u32, grace: Duration) -> bool;
}

#[cfg(not(any(unix, windows)))]
pub struct SystemTerminator;

#[cfg(not(any(unix, windows)))]
impl ProcessTerminator for SystemTerminator {
    fn send_terminate(&self, _pid: u32) -> Result<(), TerminationError> {
        Err(TerminationError::Os(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "process termination is not supported on this platform",
        )))
    }

    fn wait_exit(&self, _pid: u32, _grace: Duration) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct TerminationGateway {
    terminator: Arc<dyn ProcessTerminator>,
    grace: Duration,
}

impl TerminationGateway {
    pub fn new(terminator: impl ProcessTerminator + 'static, grace: Duration) -> Self {
        Self {
            terminator: Arc::new(terminator),
            grace,
        }
    }

    pub fn system(config: &TerminationConfig) -> Self {
        Self::new(SystemTerminator, config.grace())
    }

    pub fn terminate(&self, pid: u32) -> TerminationResult {
        let outcome = if pid == 0 || pid == std::process::id() {
            TerminationOutcome::Failed(TerminationError::Invalid(pid).to_string())
        } else {
            match self.terminator.send_terminate(pid) {
                Ok(()) if self.terminator.wait_exit(pid, self.grace) => TerminationOutcome::Exited,
                Ok(()) => TerminationOutcome::Signalled,
                Err(TerminationError::NotFound) => TerminationOutcome::NotFound,
                Err(TerminationError::PermissionDenied) => TerminationOutcome::PermissionDenied,
                Err(e) => TerminationOutcome::Failed(e.to_string()),
            }
        };

        let result = TerminationResult { pid, outcome };
        if result.is_success() {
            tracing::info!(pid, outcome = ?result.outcome, "terminate request finished");
        } else {
            tracing::warn!(pid, outcome = ?result.outcome, "terminate request failed");
        }
        result
    }
}
