//! Poll scheduler and the core handle the display layer talks to.
//!
//! Collection runs on one dedicated thread hosting a single-threaded tokio
//! runtime. The display side sends typed [`Request`]s and receives typed
//! [`CoreEvent`]s; the only shared state is the current `Arc<Snapshot>`,
//! replaced (never mutated) through a `watch` channel.

mod listeners;
mod poller;

use crate::collectors::SnapshotCollector;
use crate::config::MonitorConfig;
use crate::error::CollectionError;
use crate::filter::{filter_with, FilterFields, FilterPattern, Matcher};
use crate::snapshot::{ChangeSet, ProcessRecord, Snapshot};
use crate::terminate::{TerminationGateway, TerminationResult};
use listeners::Listeners;
use poller::Poller;
use std::sync::{mpsc as std_mpsc, Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Upper bound on waiting for an in-flight terminate call at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Display → core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Refresh,
    Terminate(u32),
    Shutdown,
}

/// Core → display
#[derive(Debug, Clone)]
pub enum CoreEvent {
    SnapshotPublished {
        snapshot: Arc<Snapshot>,
        changes: ChangeSet,
    },
    TerminationFinished(TerminationResult),
    CollectionFailed {
        sequence: u64,
        error: CollectionError,
    },
}

pub struct Monitor {
    requests: mpsc::UnboundedSender<Request>,
    current: watch::Receiver<Option<Arc<Snapshot>>>,
    listeners: Arc<Listeners>,
    fields: FilterFields,
    matcher: RwLock<Matcher>,
    worker: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Start polling the live OS.
    pub fn system(config: &MonitorConfig) -> std::io::Result<Self> {
        Self::start(
            config,
            SnapshotCollector::system(&config.sockets),
            TerminationGateway::system(&config.termination),
        )
    }

    /// Spawn the poll worker. The first snapshot is collected immediately.
    pub fn start(
        config: &MonitorConfig,
        collector: SnapshotCollector,
        gateway: TerminationGateway,
    ) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (cell, current) = watch::channel(None);
        let listeners = Arc::new(Listeners::default());
        let poller = Poller::new(collector, cell, listeners.clone());
        let interval = config.poll.interval();
        let requeue = request_tx.clone();

        let worker = std::thread::Builder::new()
            .name("portscope-poll".into())
            .spawn(move || {
                runtime.block_on(poller::run(poller, request_rx, requeue, gateway, interval));
                runtime.shutdown_timeout(SHUTDOWN_GRACE);
            })?;

        tracing::info!(interval_secs = interval.as_secs(), "poll worker started");

        let fields = FilterFields {
            owner: config.filter.match_owner,
            ..FilterFields::default()
        };
        Ok(Self {
            requests: request_tx,
            current,
            listeners,
            fields,
            matcher: RwLock::new(Matcher::compile_lossy(&FilterPattern::default())),
            worker: Some(worker),
        })
    }

    /// Run `callback` on the poll worker after every publication.
    /// The callback must not call back into this `Monitor`'s registration methods.
    pub fn on_snapshot_published(
        &self,
        callback: impl Fn(&Arc<Snapshot>, &ChangeSet) + Send + 'static,
    ) {
        self.listeners.add_callback(Box::new(callback));
    }

    /// Typed event stream. Starts with the current snapshot, if any.
    pub fn subscribe(&self) -> std_mpsc::Receiver<CoreEvent> {
        self.listeners.subscribe(&self.current)
    }

    pub fn set_filter_pattern(&self, text: &str) {
        let pattern = FilterPattern::new(text).with_fields(self.fields);
        let matcher = Matcher::compile_lossy(&pattern);
        *self.matcher.write().unwrap_or_else(|e| e.into_inner()) = matcher;
    }

    /// Latest snapshot filtered by the current pattern.
    pub fn visible_rows(&self) -> Vec<ProcessRecord> {
        let Some(snapshot) = self.latest() else {
            return Vec::new();
        };
        let matcher = self.matcher.read().unwrap_or_else(|e| e.into_inner());
        filter_with(&snapshot, &matcher)
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.current.borrow().clone()
    }

    /// Non-blocking; the outcome arrives as [`CoreEvent::TerminationFinished`].
    pub fn request_termination(&self, pid: u32) {
        self.send(Request::Terminate(pid));
    }

    pub fn request_manual_refresh(&self) {
        self.send(Request::Refresh);
    }

    /// Stop the worker and join it. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.send(Request::Shutdown);
        if worker.join().is_err() {
            tracing::error!("poll worker panicked");
        }
    }

    fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            tracing::debug!(?request, "poll worker is gone; request dropped");
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
