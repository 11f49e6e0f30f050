//! Socket → process join by owning PID.

use super::ProcessRecord;
use crate::collectors::{ProcessEntry, SocketRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Attach each socket's local port to the process that owns it.
///
/// Sockets without an owner, or whose owner is not in `processes`, are dropped.
/// Output is ordered by PID; a PID appearing twice in `processes` keeps its first entry.
pub fn correlate(processes: &[ProcessEntry], sockets: &[SocketRecord]) -> Vec<ProcessRecord> {
    let mut ports: BTreeMap<u32, BTreeSet<u16>> = BTreeMap::new();
    for socket in sockets {
        if let Some(pid) = socket.pid {
            ports.entry(pid).or_default().insert(socket.local_port);
        }
    }

    let mut by_pid: BTreeMap<u32, ProcessRecord> = BTreeMap::new();
    for entry in processes {
        by_pid.entry(entry.pid).or_insert_with(|| ProcessRecord {
            pid: entry.pid,
            name: entry.name.clone(),
            owner: entry.owner.clone(),
            ports: ports
                .get(&entry.pid)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
            cmdline: entry.cmdline.clone(),
        });
    }
    by_pid.into_values().collect()
}
