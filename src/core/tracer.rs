//! Quantum tracer: reconciles finished holds and records snapshots.

use std::time::Duration;

use tracing::{debug, error};

use crate::core::consumer::{ConsumerId, ConsumerStatus};
use crate::core::state::SchedulerState;
use crate::core::SchedulerError;
use crate::util::clock::SharedClock;

/// Occupant of one slot at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    /// Pool the slot belongs to.
    pub pool: String,
    /// Professor label.
    pub label: String,
    /// Active occupant, if any.
    pub occupant: Option<ConsumerId>,
}

/// State of the whole system at one point of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Quantum index after this snapshot was taken.
    pub quantum_index: u64,
    /// Elapsed run time.
    pub elapsed: Duration,
    /// Requested by the driver rather than caused by a quantum crossing.
    pub forced: bool,
    /// Every slot, pools in configuration order.
    pub slots: Vec<SlotView>,
    /// Every consumer status, in configuration order.
    pub statuses: Vec<(ConsumerId, ConsumerStatus)>,
}

impl Snapshot {
    /// Slots of `pool` that are held.
    #[must_use]
    pub fn occupied_in(&self, pool: &str) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.pool == pool && slot.occupant.is_some())
            .count()
    }
}

/// Destination for snapshots. The core never does I/O itself.
pub trait TraceSink: Send {
    /// Record one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Sink`] when the record cannot be stored.
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), SchedulerError>;
}

/// Periodic observer driven by the scheduling loop.
pub struct Tracer {
    quantum: Duration,
    clock: SharedClock,
    sinks: Vec<Box<dyn TraceSink>>,
    emitted: usize,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("quantum", &self.quantum)
            .field("sinks", &self.sinks.len())
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Create a tracer with no sinks.
    #[must_use]
    pub fn new(quantum: Duration, clock: SharedClock) -> Self {
        Self {
            quantum,
            clock,
            sinks: Vec::new(),
            emitted: 0,
        }
    }

    /// Add a sink; every snapshot goes to every sink in insertion order.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Snapshot period.
    #[must_use]
    pub const fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Snapshots emitted so far.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }

    /// Reconcile finished holds, then emit a snapshot if a quantum boundary
    /// was crossed or `forced` is set. Returns whether a snapshot was emitted.
    ///
    /// # Errors
    ///
    /// Propagates the first sink failure.
    pub fn poll(&mut self, state: &mut SchedulerState, forced: bool) -> Result<bool, SchedulerError> {
        let now = self.clock.now();
        state.reconcile(now);

        let elapsed = state.elapsed(now);
        let boundary = self.quantum.as_nanos() * u128::from(state.quantum_index);
        let crossed = elapsed.as_nanos() > boundary;
        if !crossed && !forced {
            return Ok(false);
        }

        if crossed {
            state.quantum_index += 1;
            for pool in &mut state.pools {
                for slot in pool.slots_mut() {
                    slot.charge_quantum(self.quantum, now);
                }
            }
        }

        let snapshot = capture(state, now, elapsed, forced && !crossed);
        for sink in &mut self.sinks {
            if let Err(err) = sink.append(&snapshot) {
                error!(error = %err, "trace sink rejected snapshot");
                return Err(err);
            }
        }
        self.emitted += 1;
        debug!(
            quantum_index = snapshot.quantum_index,
            elapsed_ms = elapsed.as_millis(),
            forced = snapshot.forced,
            "snapshot emitted"
        );
        Ok(true)
    }
}

fn capture(state: &SchedulerState, now: Duration, elapsed: Duration, forced: bool) -> Snapshot {
    let slots = state
        .pools()
        .iter()
        .flat_map(|pool| {
            pool.slots().iter().map(move |slot| SlotView {
                pool: pool.name().to_string(),
                label: slot.label().to_string(),
                occupant: slot.active_occupant(now).cloned(),
            })
        })
        .collect();

    Snapshot {
        quantum_index: state.quantum_index(),
        elapsed,
        forced,
        slots,
        statuses: state.statuses(),
    }
}
