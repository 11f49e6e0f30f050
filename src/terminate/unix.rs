//! SIGTERM via libc::kill.

use super::ProcessTerminator;
use crate::error::TerminationError;
use std::time::{Duration, Instant};

const EXIT_POLL: Duration = Duration::from_millis(50);

pub struct SystemTerminator;

/// Only strictly positive pids: 0 and negative values address process groups.
fn checked_pid(pid: u32) -> Result<libc::pid_t, TerminationError> {
    match libc::pid_t::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(raw),
        _ => Err(TerminationError::Invalid(pid)),
    }
}

fn signal(pid: u32, sig: libc::c_int) -> Result<(), TerminationError> {
    let raw = checked_pid(pid)?;
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::kill(raw, sig) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Err(TerminationError::NotFound),
        Some(libc::EPERM) => Err(TerminationError::PermissionDenied),
        _ => Err(TerminationError::Os(err)),
    }
}

/// State letter of `/proc/<pid>/stat` is `Z` (or `X`, already being reaped).
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return false;
    };
    // comm may contain spaces and parens; the state follows the last ')'
    stat.rfind(')')
        .and_then(|at| stat[at + 1..].split_whitespace().next())
        .is_some_and(|state| state == "Z" || state == "X")
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}

impl ProcessTerminator for SystemTerminator {
    fn send_terminate(&self, pid: u32) -> Result<(), TerminationError> {
        signal(pid, libc::SIGTERM)
    }

    /// A zombie still answers `kill(pid, 0)`; on Linux it counts as exited.
    fn wait_exit(&self, pid: u32, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        loop {
            if let Err(TerminationError::NotFound) = signal(pid, 0) {
                return true;
            }
            if is_zombie(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(EXIT_POLL);
        }
    }
}
