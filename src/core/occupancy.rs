//! Timed holds: one OS thread per occupied slot.
//!
//! An occupancy owns the consumer's lock guard (its *lease*) for as long as it
//! holds the slot. The hold ends in exactly one of two ways, both decided under
//! the same mutex:
//!
//! - **Completed**: the clock reached the deadline. Either the hold thread or
//!   the scheduling loop (via [`Occupancy::settle`]) records it, whichever
//!   looks first.
//! - **Cancelled**: the scheduling loop preempted it before the deadline.
//!
//! Once a phase other than `Holding` is stored it never changes again, so a
//! cancelled hold can never report a natural completion afterwards.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, RawMutex};
use tracing::{debug, trace};

use crate::core::consumer::{ConsumerId, Priority};
use crate::core::SchedulerError;
use crate::util::clock::{Clock, SharedClock};

/// Per-consumer lock. At most one occupancy holds its guard at a time.
pub type ConsumerLock = Arc<Mutex<()>>;

/// Owned guard of a [`ConsumerLock`], moved into the occupancy that uses it.
pub type ConsumerLease = lock_api::ArcMutexGuard<RawMutex, ()>;

/// Try to take a consumer's lease without blocking.
#[must_use]
pub fn try_lease(lock: &ConsumerLock) -> Option<ConsumerLease> {
    lock.try_lock_arc()
}

/// Who holds a slot, since when, and for how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyRecord {
    /// Occupant.
    pub consumer: ConsumerId,
    /// Pool the slot belongs to.
    pub pool: String,
    /// Slot index inside the pool.
    pub slot: usize,
    /// Assignment time (clock time).
    pub started_at: Duration,
    /// Hold length granted at assignment.
    pub hold: Duration,
    /// Occupant priority.
    pub priority: Priority,
}

impl OccupancyRecord {
    /// Clock time at which the hold completes naturally.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.started_at.saturating_add(self.hold)
    }

    /// Unrounded time left at `now`.
    #[must_use]
    pub fn remaining_at(&self, now: Duration) -> Duration {
        self.deadline().saturating_sub(now)
    }
}

/// Terminal state of a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    /// Still holding.
    Holding,
    /// Deadline reached.
    Completed,
    /// Preempted before the deadline.
    Cancelled,
}

struct HoldCell {
    phase: HoldPhase,
    lease: Option<ConsumerLease>,
}

impl HoldCell {
    /// Store the final phase and release the consumer lock.
    fn finish(&mut self, phase: HoldPhase) {
        self.phase = phase;
        self.lease = None;
    }
}

struct HoldShared {
    deadline: Duration,
    cell: Mutex<HoldCell>,
    signal: Condvar,
}

/// A running (or finished) timed hold installed in a slot.
pub struct Occupancy {
    record: OccupancyRecord,
    shared: Arc<HoldShared>,
    handle: Option<JoinHandle<()>>,
    reconciled: bool,
}

impl std::fmt::Debug for Occupancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Occupancy")
            .field("record", &self.record)
            .field("phase", &self.phase())
            .field("reconciled", &self.reconciled)
            .finish_non_exhaustive()
    }
}

impl Occupancy {
    /// Start the hold thread for `record`, taking ownership of the lease.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Spawn`] if the OS refuses a new thread; the
    /// lease is released in that case.
    pub fn start(
        record: OccupancyRecord,
        lease: ConsumerLease,
        clock: SharedClock,
    ) -> Result<Self, SchedulerError> {
        let shared = Arc::new(HoldShared {
            deadline: record.deadline(),
            cell: Mutex::new(HoldCell {
                phase: HoldPhase::Holding,
                lease: Some(lease),
            }),
            signal: Condvar::new(),
        });

        let thread_shared = Arc::clone(&shared);
        let consumer = record.consumer.clone();
        let handle = thread::Builder::new()
            .name(format!("hold-{}-{}", record.pool, record.slot))
            .spawn(move || hold_loop(&consumer, &thread_shared, clock.as_ref()))
            .map_err(|e| SchedulerError::Spawn(e.to_string()))?;

        debug!(
            consumer = %record.consumer,
            pool = %record.pool,
            slot = record.slot,
            hold_ms = record.hold.as_millis(),
            "hold started"
        );

        Ok(Self {
            record,
            shared,
            handle: Some(handle),
            reconciled: false,
        })
    }

    /// Occupancy record.
    #[must_use]
    pub const fn record(&self) -> &OccupancyRecord {
        &self.record
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> HoldPhase {
        self.shared.cell.lock().phase
    }

    /// Whether the hold still occupies its slot at `now`.
    #[must_use]
    pub fn is_active(&self, now: Duration) -> bool {
        self.shared.cell.lock().phase == HoldPhase::Holding && now < self.shared.deadline
    }

    /// Record natural completion if the deadline has passed and nobody has
    /// done so yet. Returns the resulting phase.
    pub fn settle(&self, now: Duration) -> HoldPhase {
        let mut cell = self.shared.cell.lock();
        if cell.phase == HoldPhase::Holding && now >= self.shared.deadline {
            cell.finish(HoldPhase::Completed);
            drop(cell);
            self.shared.signal.notify_all();
            return HoldPhase::Completed;
        }
        cell.phase
    }

    /// Preempt the hold. Returns the unrounded remaining time, or `None` if the
    /// hold had already ended (naturally or by an earlier cancel).
    pub fn cancel(&self, now: Duration) -> Option<Duration> {
        let mut cell = self.shared.cell.lock();
        if cell.phase != HoldPhase::Holding || now >= self.shared.deadline {
            return None;
        }
        cell.finish(HoldPhase::Cancelled);
        drop(cell);
        self.shared.signal.notify_all();
        Some(self.shared.deadline - now)
    }

    pub(crate) const fn is_reconciled(&self) -> bool {
        self.reconciled
    }

    pub(crate) fn mark_reconciled(&mut self) {
        self.reconciled = true;
    }

    /// Detach the thread handle so the caller can join it later.
    pub(crate) fn take_handle(&mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }
}

impl Drop for Occupancy {
    fn drop(&mut self) {
        // A hold abandoned mid-run must not keep the consumer locked.
        let mut cell = self.shared.cell.lock();
        if cell.phase == HoldPhase::Holding {
            cell.finish(HoldPhase::Cancelled);
            drop(cell);
            self.shared.signal.notify_all();
        }
    }
}

fn hold_loop(consumer: &str, shared: &HoldShared, clock: &dyn Clock) {
    let mut cell = shared.cell.lock();
    while cell.phase == HoldPhase::Holding {
        let now = clock.now();
        if now >= shared.deadline {
            cell.finish(HoldPhase::Completed);
            trace!(consumer, "hold completed on its own thread");
            return;
        }
        let wait = clock.park_timeout(shared.deadline - now);
        shared.signal.wait_for(&mut cell, wait);
    }
    trace!(consumer, phase = ?cell.phase, "hold thread exiting");
}
