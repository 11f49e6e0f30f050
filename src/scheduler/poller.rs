//! The background poll loop: `Idle → Polling → Idle` on a timer, short-circuited
//! by requests.

use super::listeners::Listeners;
use super::{CoreEvent, Request};
use crate::collectors::SnapshotCollector;
use crate::snapshot::{diff, ChangeSet, Snapshot};
use crate::terminate::{TerminationGateway, TerminationOutcome, TerminationResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollState {
    Idle,
    Polling,
}

/// Single writer of the published snapshot.
pub(crate) struct Poller {
    collector: SnapshotCollector,
    next_sequence: u64,
    cell: watch::Sender<Option<Arc<Snapshot>>>,
    listeners: Arc<Listeners>,
    state: PollState,
}

impl Poller {
    pub fn new(
        collector: SnapshotCollector,
        cell: watch::Sender<Option<Arc<Snapshot>>>,
        listeners: Arc<Listeners>,
    ) -> Self {
        Self {
            collector,
            next_sequence: 1,
            cell,
            listeners,
            state: PollState::Idle,
        }
    }

    /// One collection cycle. A failed cycle still consumes its sequence number.
    pub fn cycle(&mut self) {
        self.state = PollState::Polling;
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        match self.collector.collect(sequence) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let changes = match self.cell.borrow().as_ref() {
                    Some(previous) => diff(previous, &snapshot),
                    None => ChangeSet {
                        added: snapshot.processes.iter().map(|p| p.pid).collect(),
                        ..ChangeSet::default()
                    },
                };
                tracing::debug!(
                    sequence,
                    processes = snapshot.process_count(),
                    added = changes.added.len(),
                    removed = changes.removed.len(),
                    changed = changes.changed.len(),
                    "publishing snapshot"
                );
                self.listeners.publish(&self.cell, snapshot, changes);
            }
            Err(error) => {
                tracing::warn!(
                    sequence,
                    error = %error,
                    "collection failed; keeping previous snapshot"
                );
                self.listeners.emit(CoreEvent::CollectionFailed { sequence, error });
            }
        }
        self.state = PollState::Idle;
    }

    pub fn state(&self) -> PollState {
        self.state
    }
}

/// Worker body. Returns on `Shutdown` or when every request sender is gone.
pub(crate) async fn run(
    mut poller: Poller,
    mut requests: mpsc::UnboundedReceiver<Request>,
    requeue: mpsc::UnboundedSender<Request>,
    gateway: TerminationGateway,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => poller.cycle(),
            request = requests.recv() => match request {
                Some(Request::Refresh) => {
                    tracing::debug!("manual refresh");
                    poller.cycle();
                    ticker.reset();
                }
                Some(Request::Terminate(pid)) => {
                    spawn_termination(
                        pid,
                        gateway.clone(),
                        poller.listeners.clone(),
                        requeue.clone(),
                    );
                }
                Some(Request::Shutdown) | None => break,
            },
        }
        debug_assert_eq!(poller.state(), PollState::Idle);
    }
    tracing::info!("poll worker stopped");
}

/// The OS call runs on the blocking pool; the result and the follow-up refresh
/// go back through queues.
fn spawn_termination(
    pid: u32,
    gateway: TerminationGateway,
    listeners: Arc<Listeners>,
    requeue: mpsc::UnboundedSender<Request>,
) {
    tokio::spawn(async move {
        let result = match tokio::task::spawn_blocking(move || gateway.terminate(pid)).await {
            Ok(result) => result,
            Err(e) => TerminationResult {
                pid,
                outcome: TerminationOutcome::Failed(e.to_string()),
            },
        };
        listeners.emit(CoreEvent::TerminationFinished(result));
        let _ = requeue.send(Request::Refresh);
    });
}
