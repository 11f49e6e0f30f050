//! Snapshot collection: OS process and socket sources behind small capability traits.
//! Per-entity failures are absorbed here; only facility-level failures escape.

mod network;
mod process;

use crate::config::SocketsConfig;
use crate::error::{AccessError, CollectionError};
use crate::snapshot::{correlate, Snapshot};
use serde::{Deserialize, Serialize};

pub use network::NetstatSocketSource;
pub use process::SysinfoProcessSource;

/// Raw process identity before ports are attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub owner: String,
    pub cmdline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketState {
    Listen,
    Established,
    Other,
}

/// One socket binding. Lives only until correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketRecord {
    pub local_port: u16,
    /// `None` when the OS does not expose the owner
    pub pid: Option<u32>,
    pub protocol: Protocol,
    pub state: Option<SocketState>,
}

/// Something that can list processes.
pub trait ProcessSource: Send {
    fn processes(&mut self) -> Result<Vec<Result<ProcessEntry, AccessError>>, CollectionError>;
}

/// Something that can list sockets with their owning PIDs.
pub trait SocketSource: Send {
    fn sockets(&mut self) -> Result<Vec<Result<SocketRecord, AccessError>>, CollectionError>;
}

/// Samples both sources and correlates them into a [`Snapshot`].
pub struct SnapshotCollector {
    processes: Box<dyn ProcessSource>,
    sockets: Box<dyn SocketSource>,
}

impl SnapshotCollector {
    pub fn new(
        processes: impl ProcessSource + 'static,
        sockets: impl SocketSource + 'static,
    ) -> Self {
        Self {
            processes: Box::new(processes),
            sockets: Box::new(sockets),
        }
    }

    /// Collector backed by the live OS.
    pub fn system(config: &SocketsConfig) -> Self {
        Self::new(
            SysinfoProcessSource::new(),
            NetstatSocketSource::new(config.clone()),
        )
    }

    pub fn collect(&mut self, sequence: u64) -> Result<Snapshot, CollectionError> {
        let (processes, skipped_processes) = partition(self.processes.processes()?);
        let (sockets, skipped_sockets) = partition(self.sockets.sockets()?);

        if skipped_processes + skipped_sockets > 0 {
            tracing::trace!(
                sequence,
                skipped_processes,
                skipped_sockets,
                "skipped unreadable entities"
            );
        }

        let records = correlate(&processes, &sockets);
        tracing::debug!(
            sequence,
            processes = records.len(),
            sockets = sockets.len(),
            "snapshot collected"
        );
        Ok(Snapshot::new(sequence, records))
    }
}

fn partition<T>(items: Vec<Result<T, AccessError>>) -> (Vec<T>, usize) {
    let mut ok = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for item in items {
        match item {
            Ok(v) => ok.push(v),
            Err(_) => skipped += 1,
        }
    }
    (ok, skipped)
}
