#![allow(dead_code)]

use portscope::collectors::{
    ProcessEntry, ProcessSource, Protocol, SocketRecord, SocketSource, SocketState,
};
use portscope::error::{AccessError, CollectionError};
use portscope::snapshot::{ProcessRecord, Snapshot};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn entry(pid: u32, name: &str, owner: &str) -> ProcessEntry {
    ProcessEntry {
        pid,
        name: name.to_string(),
        owner: owner.to_string(),
        cmdline: format!("/usr/bin/{} --serve", name),
    }
}

pub fn listen(port: u16, pid: Option<u32>) -> SocketRecord {
    SocketRecord {
        local_port: port,
        pid,
        protocol: Protocol::Tcp,
        state: Some(SocketState::Listen),
    }
}

pub fn record(pid: u32, name: &str, ports: &[u16]) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.to_string(),
        owner: String::new(),
        ports: ports.to_vec(),
        cmdline: String::new(),
    }
}

/// chrome (pid 100, ports 80/443) and sshd (pid 200, port 22)
pub fn sample_snapshot() -> Snapshot {
    Snapshot::new(
        1,
        vec![record(100, "chrome", &[80, 443]), record(200, "sshd", &[22])],
    )
}

/// Process list shared with the test so it can be changed between cycles.
#[derive(Clone, Default)]
pub struct FakeProcesses {
    pub entries: Arc<Mutex<Vec<Result<ProcessEntry, AccessError>>>>,
    pub fail: Arc<AtomicBool>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeProcesses {
    pub fn with(entries: Vec<ProcessEntry>) -> Self {
        let fake = Self::default();
        fake.set(entries);
        fake
    }

    pub fn set(&self, entries: Vec<ProcessEntry>) {
        *self.entries.lock().unwrap() = entries.into_iter().map(Ok).collect();
    }

    pub fn push_unreadable(&self, error: AccessError) {
        self.entries.lock().unwrap().push(Err(error));
    }
}

impl ProcessSource for FakeProcesses {
    fn processes(&mut self) -> Result<Vec<Result<ProcessEntry, AccessError>>, CollectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollectionError::Processes("injected failure".into()));
        }
        Ok(self.entries.lock().unwrap().clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeSockets {
    pub records: Arc<Mutex<Vec<Result<SocketRecord, AccessError>>>>,
}

impl FakeSockets {
    pub fn with(records: Vec<SocketRecord>) -> Self {
        let fake = Self::default();
        *fake.records.lock().unwrap() = records.into_iter().map(Ok).collect();
        fake
    }
}

impl SocketSource for FakeSockets {
    fn sockets(&mut self) -> Result<Vec<Result<SocketRecord, AccessError>>, CollectionError> {
        Ok(self.records.lock().unwrap().clone())
    }
}
