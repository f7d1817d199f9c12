//! Trace sink forwarding snapshots to another thread.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use tracing::warn;

use crate::core::{SchedulerError, Snapshot, TraceSink};

/// Sends every snapshot over a crossbeam channel.
///
/// A bounded sink never blocks the scheduling loop: when the channel is full
/// the snapshot is dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Snapshot>,
}

impl ChannelSink {
    /// Sink backed by an unbounded channel.
    #[must_use]
    pub fn unbounded() -> (Self, Receiver<Snapshot>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    /// Sink backed by a channel holding at most `capacity` snapshots.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<Snapshot>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl TraceSink for ChannelSink {
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SchedulerError> {
        match self.tx.try_send(snapshot.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                warn!(quantum_index = dropped.quantum_index, "trace channel full, snapshot dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(SchedulerError::Sink("trace receiver disconnected".into()))
            }
        }
    }
}
