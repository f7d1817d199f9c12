//! Run driver: ARRIVING → DRAINING → DONE.

use std::time::Duration;

use tracing::info;

use crate::core::consumer::{ConsumerId, ConsumerStatus};
use crate::core::engine::{Admission, AdmissionEngine};
use crate::core::state::SchedulerState;
use crate::core::tracer::Tracer;
use crate::core::SchedulerError;
use crate::util::clock::SharedClock;

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Consumers are still pending or waiting; passes run every poll.
    Arriving,
    /// Everyone is admitted; waiting for the last holds to finish.
    Draining,
    /// No hold left. One more quantum, a final snapshot, then stop.
    Done,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Time from start to the final snapshot.
    pub elapsed: Duration,
    /// Final statuses in configuration order.
    pub statuses: Vec<(ConsumerId, ConsumerStatus)>,
    /// Every admission in the order it was made.
    pub decisions: Vec<Admission>,
    /// Snapshots emitted.
    pub snapshots: usize,
    /// Scheduling passes run.
    pub passes: u64,
}

/// Owns the scheduler for one run.
#[derive(Debug)]
pub struct Driver {
    state: SchedulerState,
    engine: AdmissionEngine,
    tracer: Tracer,
    clock: SharedClock,
    poll_interval: Duration,
    phase: Phase,
}

impl Driver {
    /// Assemble a driver. `poll_interval` is how long the loop sleeps between
    /// polls; it should not exceed the tracer's quantum.
    #[must_use]
    pub const fn new(
        state: SchedulerState,
        engine: AdmissionEngine,
        tracer: Tracer,
        clock: SharedClock,
        poll_interval: Duration,
    ) -> Self {
        Self {
            state,
            engine,
            tracer,
            clock,
            poll_interval,
            phase: Phase::Arriving,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Scheduler state.
    #[must_use]
    pub const fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Run to completion.
    ///
    /// # Errors
    ///
    /// Returns the first engine or sink error. Holds still running are
    /// cancelled when the driver is dropped.
    pub fn run(mut self) -> Result<RunSummary, SchedulerError> {
        info!(
            policy = ?self.engine.policy(),
            quantum_ms = self.tracer.quantum().as_millis(),
            consumers = self.state.consumer_order().len(),
            "run started"
        );
        self.tracer.poll(&mut self.state, true)?;

        loop {
            match self.phase {
                Phase::Arriving => {
                    self.tracer.poll(&mut self.state, false)?;
                    self.engine.pass(&mut self.state)?;
                    if self.state.all_admitted() {
                        self.enter(Phase::Draining);
                    } else {
                        self.clock.sleep(self.poll_interval);
                    }
                }
                Phase::Draining => {
                    self.tracer.poll(&mut self.state, false)?;
                    if self.state.has_active_occupancy(self.clock.now()) {
                        self.clock.sleep(self.poll_interval);
                    } else {
                        self.enter(Phase::Done);
                    }
                }
                Phase::Done => {
                    self.clock.sleep(self.tracer.quantum());
                    self.tracer.poll(&mut self.state, true)?;
                    break;
                }
            }
        }

        let now = self.clock.now();
        self.state.shutdown(now);
        let summary = RunSummary {
            elapsed: self.state.elapsed(now),
            statuses: self.state.statuses(),
            decisions: self.engine.decisions().to_vec(),
            snapshots: self.tracer.emitted(),
            passes: self.engine.passes(),
        };
        info!(
            elapsed_ms = summary.elapsed.as_millis(),
            passes = summary.passes,
            snapshots = summary.snapshots,
            "run finished"
        );
        Ok(summary)
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
    }
}
