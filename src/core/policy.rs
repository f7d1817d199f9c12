//! Slot selection rules shared by both scheduling modes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::consumer::Consumer;
use crate::core::resource_pool::ResourcePool;

/// How an occupant's remaining time is measured when comparing it against a
/// candidate's burst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainingEstimate {
    /// `hold - (now - start)`, recomputed at comparison time.
    #[default]
    Continuous,
    /// The per-quantum bookkeeping value maintained by the tracer.
    QuantumRounded,
}

/// Whether and how occupants may be evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreemptionPolicy {
    /// Occupants always run to completion.
    #[default]
    None,
    /// Evict strictly lower priority first, then equal priority with more
    /// remaining time than the candidate's burst.
    PriorityAndBurst,
}

/// Which preemption rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreemptRule {
    /// Occupant priority is numerically greater than the candidate's.
    LowerPriority,
    /// Same priority, occupant remaining time exceeds the candidate's burst.
    LongerRemaining,
}

/// Where a candidate goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// An unoccupied slot.
    Free(usize),
    /// An occupied slot whose occupant must be evicted first.
    Preempt {
        /// Slot index.
        slot: usize,
        /// Rule that selected it.
        rule: PreemptRule,
    },
}

impl Placement {
    /// Slot index regardless of kind.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::Free(slot) | Self::Preempt { slot, .. } => slot,
        }
    }
}

impl PreemptionPolicy {
    /// Pick a slot in `pool` for `candidate`, first match wins: a free slot,
    /// then (preemptive only) a lower-priority occupant, then an
    /// equal-priority occupant with more remaining time than the candidate's
    /// burst. Slots are scanned in index order for each rule.
    #[must_use]
    pub fn place(
        self,
        pool: &ResourcePool,
        candidate: &Consumer,
        now: Duration,
        estimate: RemainingEstimate,
    ) -> Option<Placement> {
        if let Some(slot) = pool.try_acquire(now) {
            return Some(Placement::Free(slot));
        }
        if !self.is_preemptive() {
            return None;
        }
        Self::select_victim(pool, candidate, now, estimate)
    }

    /// Preemption rules only; assumes every slot is held.
    #[must_use]
    pub fn select_victim(
        pool: &ResourcePool,
        candidate: &Consumer,
        now: Duration,
        estimate: RemainingEstimate,
    ) -> Option<Placement> {
        let held = || {
            pool.slots()
                .iter()
                .enumerate()
                .filter(move |(_, slot)| slot.is_active(now))
        };

        if let Some((slot, _)) = held().find(|(_, slot)| slot.priority() > candidate.priority) {
            return Some(Placement::Preempt {
                slot,
                rule: PreemptRule::LowerPriority,
            });
        }

        held()
            .find(|(_, slot)| {
                slot.priority() == candidate.priority
                    && slot
                        .remaining(now, estimate)
                        .is_some_and(|left| left > candidate.burst)
            })
            .map(|(slot, _)| Placement::Preempt {
                slot,
                rule: PreemptRule::LongerRemaining,
            })
    }

    /// Whether this policy ever evicts.
    #[must_use]
    pub const fn is_preemptive(self) -> bool {
        matches!(self, Self::PriorityAndBurst)
    }
}
