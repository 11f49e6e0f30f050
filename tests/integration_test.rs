//! Integration test: config load, collection, correlation and diff.

mod common;

use common::{entry, listen, record, sample_snapshot, FakeProcesses, FakeSockets};
use portscope::{
    collectors::{ProcessSource, SnapshotCollector, SysinfoProcessSource},
    config::{MonitorConfig, SocketsConfig},
    error::{AccessError, CollectionError},
    snapshot::{correlate, diff, Snapshot},
};
use std::collections::HashSet;
use std::path::Path;

#[test]
fn config_load_default() {
    let c = MonitorConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.poll.interval_secs, 3);
    assert_eq!(c.termination.grace_millis, 3000);
    assert!(!c.sockets.include_established);
    assert!(!c.filter.match_owner);
}

#[test]
fn config_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"poll":{"interval_secs":10},"sockets":{"include_udp":true}}"#,
    )
    .unwrap();

    let c = MonitorConfig::load(&path);
    assert_eq!(c.poll.interval_secs, 10);
    assert!(c.sockets.include_udp);
    assert!(!c.sockets.include_established);
    assert_eq!(c.log.level, "info");
}

#[test]
fn config_invalid_json_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(MonitorConfig::try_load(&path).is_err());
    assert_eq!(MonitorConfig::load(&path).poll.interval_secs, 3);
}

#[test]
fn config_interval_never_zero() {
    let mut c = MonitorConfig::default();
    c.poll.interval_secs = 0;
    assert_eq!(c.poll.interval().as_secs(), 1);
}

#[test]
fn explicit_config_path_wins() {
    let p = MonitorConfig::resolve_path(Some(Path::new("/tmp/x.json")));
    assert_eq!(p, Path::new("/tmp/x.json"));
}

#[test]
fn system_snapshot_invariants() {
    let mut collector = SnapshotCollector::system(&SocketsConfig::default());
    // Socket tables may be unavailable in restricted sandboxes
    let Ok(snapshot) = collector.collect(1) else {
        return;
    };
    assert!(snapshot.process_count() > 0);
    let pids: HashSet<u32> = snapshot.processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids.len(), snapshot.process_count());
    for p in &snapshot.processes {
        assert!(
            p.ports.windows(2).all(|w| w[0] < w[1]),
            "ports of {} not strictly ascending",
            p.pid
        );
    }
    assert!(snapshot.contains(std::process::id()));
}

#[cfg(target_os = "linux")]
#[test]
fn system_processes_exclude_threads() {
    use std::sync::mpsc;

    let (tid_tx, tid_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let worker = std::thread::spawn(move || {
        let tid = unsafe { libc::gettid() } as u32;
        tid_tx.send(tid).unwrap();
        let _ = done_rx.recv();
    });
    let tid = tid_rx.recv().unwrap();
    assert_ne!(tid, std::process::id());

    let mut source = SysinfoProcessSource::new();
    let pids: HashSet<u32> = source
        .processes()
        .unwrap()
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| e.pid)
        .collect();

    done_tx.send(()).unwrap();
    worker.join().unwrap();

    assert!(pids.contains(&std::process::id()));
    assert!(!pids.contains(&tid), "thread {} listed as a process", tid);
}

#[test]
fn correlate_dedups_and_sorts_ports() {
    let processes = vec![entry(10, "nginx", "www"), entry(20, "redis", "redis")];
    let sockets = vec![
        listen(443, Some(10)),
        listen(80, Some(10)),
        listen(443, Some(10)),
        listen(6379, Some(20)),
    ];
    let records = correlate(&processes, &sockets);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].ports, vec![80, 443]);
    assert_eq!(records[1].ports, vec![6379]);
}

#[test]
fn correlate_drops_unowned_and_unknown_sockets() {
    let processes = vec![entry(10, "nginx", "www")];
    let sockets = vec![listen(53, None), listen(8080, Some(999)), listen(80, Some(10))];
    let records = correlate(&processes, &sockets);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ports, vec![80]);
}

#[test]
fn correlate_orders_by_pid_and_keeps_first_duplicate() {
    let processes = vec![entry(30, "c", ""), entry(10, "a", ""), entry(30, "dup", "")];
    let records = correlate(&processes, &[]);
    let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
    assert_eq!(pids, vec![10, 30]);
    assert_eq!(records[1].name, "c");
    assert!(records.iter().all(|r| r.ports.is_empty()));
}

#[test]
fn collector_skips_unreadable_entities() {
    let procs = FakeProcesses::with(vec![entry(1, "init", "root"), entry(42, "sshd", "root")]);
    procs.push_unreadable(AccessError::Denied);
    procs.push_unreadable(AccessError::Vanished);
    let sockets = FakeSockets::with(vec![listen(22, Some(42))]);
    sockets
        .records
        .lock()
        .unwrap()
        .push(Err(AccessError::Other("bad inode".into())));

    let mut collector = SnapshotCollector::new(procs, sockets);
    let snapshot = collector.collect(7).unwrap();
    assert_eq!(snapshot.sequence, 7);
    assert_eq!(snapshot.process_count(), 2);
    assert_eq!(snapshot.get(42).unwrap().ports, vec![22]);
}

#[test]
fn collector_reports_facility_failure() {
    let procs = FakeProcesses::with(vec![entry(1, "init", "root")]);
    procs.fail.store(true, std::sync::atomic::Ordering::SeqCst);
    let mut collector = SnapshotCollector::new(procs, FakeSockets::default());
    assert!(matches!(collector.collect(1), Err(CollectionError::Processes(_))));
}

#[test]
fn diff_of_snapshot_with_itself_is_empty() {
    let s = sample_snapshot();
    assert!(diff(&s, &s).is_empty());
}

#[test]
fn diff_detects_single_removal() {
    let s1 = sample_snapshot();
    let s2 = Snapshot::new(2, vec![record(100, "chrome", &[80, 443])]);
    let changes = diff(&s1, &s2);
    assert_eq!(changes.removed, vec![200]);
    assert!(changes.added.is_empty());
    assert!(changes.changed.is_empty());
}

#[test]
fn diff_detects_additions_and_field_changes() {
    let s1 = sample_snapshot();
    let mut sshd = record(200, "sshd", &[22]);
    sshd.owner = "root".into();
    let s2 = Snapshot::new(
        2,
        vec![
            record(100, "chrome", &[80]),
            sshd,
            record(300, "postgres", &[5432]),
        ],
    );
    let changes = diff(&s1, &s2);
    assert_eq!(changes.added, vec![300]);
    assert_eq!(changes.changed, vec![100, 200]);
    assert!(changes.removed.is_empty());
    assert_eq!(changes.touched().count(), 3);
}
