//! Cycle-to-cycle change detection. Drives highlighting only; the full
//! snapshot stays authoritative.

use super::{ProcessRecord, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<u32>,
    pub removed: Vec<u32>,
    /// Present in both, with any field different (owner and cmdline included)
    pub changed: Vec<u32>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Every PID touched by this change set.
    pub fn touched(&self) -> impl Iterator<Item = u32> + '_ {
        self.added
            .iter()
            .chain(self.removed.iter())
            .chain(self.changed.iter())
            .copied()
    }
}

/// Compare two snapshots by PID. All three lists come out ascending.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> ChangeSet {
    let before: HashMap<u32, &ProcessRecord> =
        previous.processes.iter().map(|p| (p.pid, p)).collect();
    let after: HashMap<u32, &ProcessRecord> =
        current.processes.iter().map(|p| (p.pid, p)).collect();

    let mut changes = ChangeSet::default();
    for (pid, record) in &after {
        match before.get(pid) {
            None => changes.added.push(*pid),
            Some(old) if *old != *record => changes.changed.push(*pid),
            Some(_) => {}
        }
    }
    changes.removed = before
        .keys()
        .filter(|pid| !after.contains_key(pid))
        .copied()
        .collect();

    changes.added.sort_unstable();
    changes.removed.sort_unstable();
    changes.changed.sort_unstable();
    changes
}
