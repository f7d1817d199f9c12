//! In-memory trace sink.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{SchedulerError, Snapshot, TraceSink};

/// Keeps snapshots in memory. Clones share the same buffer, so a caller can
/// keep one handle and give the other to the tracer.
#[derive(Debug, Clone)]
pub struct MemorySink {
    snapshots: Arc<Mutex<VecDeque<Snapshot>>>,
    max_snapshots: Option<usize>,
}

impl MemorySink {
    /// Keep every snapshot.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(VecDeque::new())),
            max_snapshots: None,
        }
    }

    /// Keep the latest `max_snapshots` snapshots only.
    #[must_use]
    pub fn bounded(max_snapshots: usize) -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(VecDeque::with_capacity(max_snapshots))),
            max_snapshots: Some(max_snapshots),
        }
    }

    /// Copy of the stored snapshots, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().iter().cloned().collect()
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

impl TraceSink for MemorySink {
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SchedulerError> {
        let mut snapshots = self.snapshots.lock();
        if let Some(max) = self.max_snapshots {
            if max == 0 {
                return Ok(());
            }
            if snapshots.len() >= max {
                snapshots.pop_front();
            }
        }
        snapshots.push_back(snapshot.clone());
        Ok(())
    }
}
