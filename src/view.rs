//! Interactive-side table state built from published snapshots.

use crate::filter::{filter_with, FilterFields, FilterPattern, Matcher};
use crate::snapshot::{ChangeSet, ProcessRecord, Snapshot};
use std::collections::HashSet;
use std::sync::Arc;

pub struct ProcessView {
    snapshot: Option<Arc<Snapshot>>,
    highlighted: HashSet<u32>,
    pattern: FilterPattern,
    matcher: Matcher,
    rows: Vec<ProcessRecord>,
}

impl Default for ProcessView {
    fn default() -> Self {
        Self::new(FilterFields::default())
    }
}

impl ProcessView {
    pub fn new(fields: FilterFields) -> Self {
        let pattern = FilterPattern::default().with_fields(fields);
        Self {
            snapshot: None,
            highlighted: HashSet::new(),
            matcher: Matcher::compile_lossy(&pattern),
            pattern,
            rows: Vec::new(),
        }
    }

    /// Take a newer snapshot. Returns false (and changes nothing) for a stale or repeated sequence.
    pub fn accept(&mut self, snapshot: Arc<Snapshot>, changes: &ChangeSet) -> bool {
        if let Some(current) = &self.snapshot {
            if snapshot.sequence <= current.sequence {
                tracing::debug!(
                    current = current.sequence,
                    received = snapshot.sequence,
                    "discarding stale snapshot"
                );
                return false;
            }
        }
        self.highlighted = changes.added.iter().chain(&changes.changed).copied().collect();
        self.snapshot = Some(snapshot);
        self.refilter();
        true
    }

    pub fn set_pattern(&mut self, text: &str) {
        self.pattern.text = text.to_string();
        self.matcher = Matcher::compile_lossy(&self.pattern);
        self.refilter();
    }

    pub fn pattern(&self) -> &str {
        &self.pattern.text
    }

    pub fn rows(&self) -> &[ProcessRecord] {
        &self.rows
    }

    pub fn sequence(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.sequence)
    }

    pub fn total(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.process_count())
    }

    /// Added or changed in the most recent cycle.
    pub fn is_highlighted(&self, pid: u32) -> bool {
        self.highlighted.contains(&pid)
    }

    /// Full record, including the command line, regardless of the current filter.
    pub fn find(&self, pid: u32) -> Option<&ProcessRecord> {
        self.snapshot.as_ref().and_then(|s| s.get(pid))
    }

    fn refilter(&mut self) {
        self.rows = match &self.snapshot {
            Some(snapshot) => filter_with(snapshot, &self.matcher),
            None => Vec::new(),
        };
    }
}
