//! Event fan-out from the poll worker to the interactive side.

use super::CoreEvent;
use crate::snapshot::{ChangeSet, Snapshot};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

pub(crate) type SnapshotCallback = Box<dyn Fn(&Arc<Snapshot>, &ChangeSet) + Send>;

#[derive(Default)]
struct Inner {
    callbacks: Vec<SnapshotCallback>,
    subscribers: Vec<Sender<CoreEvent>>,
}

/// Callbacks and channel subscribers. Publication and subscription are
/// serialized by one lock so a new subscriber never misses or reorders a snapshot.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Mutex<Inner>,
}

impl Listeners {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_callback(&self, callback: SnapshotCallback) {
        self.lock().callbacks.push(callback);
    }

    /// New subscriber; replays the current snapshot first if there is one.
    pub fn subscribe(
        &self,
        current: &watch::Receiver<Option<Arc<Snapshot>>>,
    ) -> Receiver<CoreEvent> {
        let (tx, rx) = channel();
        let mut inner = self.lock();
        let latest = current.borrow().clone();
        if let Some(snapshot) = latest {
            let changes = ChangeSet {
                added: snapshot.processes.iter().map(|p| p.pid).collect(),
                ..ChangeSet::default()
            };
            let _ = tx.send(CoreEvent::SnapshotPublished { snapshot, changes });
        }
        inner.subscribers.push(tx);
        rx
    }

    /// Swap the shared snapshot and notify everyone, as one step.
    pub fn publish(
        &self,
        cell: &watch::Sender<Option<Arc<Snapshot>>>,
        snapshot: Arc<Snapshot>,
        changes: ChangeSet,
    ) {
        let mut inner = self.lock();
        cell.send_replace(Some(snapshot.clone()));
        for callback in &inner.callbacks {
            callback(&snapshot, &changes);
        }
        Self::broadcast(&mut inner, CoreEvent::SnapshotPublished { snapshot, changes });
    }

    pub fn emit(&self, event: CoreEvent) {
        Self::broadcast(&mut self.lock(), event);
    }

    fn broadcast(inner: &mut Inner, event: CoreEvent) {
        inner
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
