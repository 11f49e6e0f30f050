//! Published process/port snapshots and the pure stages that build and compare them.

mod correlate;
mod diff;

pub use correlate::correlate;
pub use diff::{diff, ChangeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One process and the ports it owned at the sampling instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    /// Empty when the owning user could not be resolved
    pub owner: String,
    /// Ascending, no duplicates
    pub ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cmdline: String,
}

impl ProcessRecord {
    /// Ports joined for display, e.g. `"22,80,443"`.
    pub fn ports_label(&self) -> String {
        self.ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A consistent view of all processes at one sampling instant.
///
/// Shared as `Arc<Snapshot>` once published and never mutated afterwards;
/// the next cycle supersedes it with a higher `sequence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: u64,
    pub taken_at: DateTime<Utc>,
    /// Ordered by PID
    pub processes: Vec<ProcessRecord>,
}

impl Snapshot {
    /// Sorts by PID and keeps the first record of any repeated PID.
    pub fn new(sequence: u64, mut processes: Vec<ProcessRecord>) -> Self {
        processes.sort_by_key(|p| p.pid);
        processes.dedup_by_key(|p| p.pid);
        Self {
            sequence,
            taken_at: Utc::now(),
            processes,
        }
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.processes
            .binary_search_by_key(&pid, |p| p.pid)
            .ok()
            .map(|i| &self.processes[i])
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.get(pid).is_some()
    }
}
