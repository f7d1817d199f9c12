//! Resource pools (disciplines) and their capacity slots.

use std::time::Duration;

use crate::core::consumer::{ConsumerId, Priority};
use crate::core::occupancy::Occupancy;
use crate::core::policy::RemainingEstimate;

/// One unit of capacity in a pool.
#[derive(Debug)]
pub struct Slot {
    /// Professor contributing this slot.
    label: String,
    /// Latest occupancy; kept after it finishes until the slot is reused.
    occupancy: Option<Occupancy>,
    /// Quantum-rounded remaining time of the current occupant.
    tracked_remaining: Duration,
    /// Priority of the current occupant.
    priority: Priority,
}

impl Slot {
    /// Create an empty slot.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            occupancy: None,
            tracked_remaining: Duration::ZERO,
            priority: 0,
        }
    }

    /// Professor label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Latest occupancy, active or not.
    #[must_use]
    pub const fn occupancy(&self) -> Option<&Occupancy> {
        self.occupancy.as_ref()
    }

    pub(crate) fn occupancy_mut(&mut self) -> Option<&mut Occupancy> {
        self.occupancy.as_mut()
    }

    /// Occupant id if the slot is held at `now`.
    #[must_use]
    pub fn active_occupant(&self, now: Duration) -> Option<&ConsumerId> {
        self.occupancy
            .as_ref()
            .filter(|occ| occ.is_active(now))
            .map(|occ| &occ.record().consumer)
    }

    /// Whether a hold is in progress at `now`.
    #[must_use]
    pub fn is_active(&self, now: Duration) -> bool {
        self.occupancy.as_ref().is_some_and(|occ| occ.is_active(now))
    }

    /// Priority of the latest occupant.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Remaining time tracked at quantum granularity.
    #[must_use]
    pub const fn tracked_remaining(&self) -> Duration {
        self.tracked_remaining
    }

    /// Remaining time of the active occupant as seen by `estimate`, or `None`
    /// when the slot is not held.
    #[must_use]
    pub fn remaining(&self, now: Duration, estimate: RemainingEstimate) -> Option<Duration> {
        let occ = self.occupancy.as_ref().filter(|occ| occ.is_active(now))?;
        Some(match estimate {
            RemainingEstimate::Continuous => occ.record().remaining_at(now),
            RemainingEstimate::QuantumRounded => self.tracked_remaining,
        })
    }

    /// Put a new occupancy in place, returning the one it replaces.
    pub(crate) fn install(&mut self, occupancy: Occupancy) -> Option<Occupancy> {
        self.tracked_remaining = occupancy.record().hold;
        self.priority = occupancy.record().priority;
        self.occupancy.replace(occupancy)
    }

    /// Quantum bookkeeping for an active occupant.
    pub(crate) fn charge_quantum(&mut self, quantum: Duration, now: Duration) {
        if self.is_active(now) {
            self.tracked_remaining = self.tracked_remaining.saturating_sub(quantum);
        }
    }
}

/// A named pool with a fixed number of slots.
#[derive(Debug)]
pub struct ResourcePool {
    name: String,
    slots: Vec<Slot>,
}

impl ResourcePool {
    /// Create a pool with one slot per label.
    pub fn new(name: impl Into<String>, labels: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: name.into(),
            slots: labels.into_iter().map(Slot::new).collect(),
        }
    }

    /// Create a pool with `capacity` anonymous slots.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let name = name.into();
        let labels = (0..capacity).map(|i| format!("{name}#{i}")).collect::<Vec<_>>();
        Self::new(name, labels)
    }

    /// Pool (discipline) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slots in scan order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// Number of slots; fixed at creation.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// First slot, scanning left to right, that is not held at `now`.
    #[must_use]
    pub fn try_acquire(&self, now: Duration) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.is_active(now))
    }

    /// Number of slots held at `now`.
    #[must_use]
    pub fn active_count(&self, now: Duration) -> usize {
        self.slots.iter().filter(|slot| slot.is_active(now)).count()
    }
}
