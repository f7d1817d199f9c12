//! Consumers (students) and their lifecycle status.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Consumer identifier as given in the scenario.
pub type ConsumerId = String;

/// Scheduling priority. Lower values take precedence.
pub type Priority = i64;

/// Lifecycle status of a consumer as reported in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerStatus {
    /// Arrival time not reached yet.
    NotArrived,
    /// Arrived, waiting for a slot.
    Waiting,
    /// Holding a slot.
    Running,
    /// Every required pool satisfied and no slot held.
    Done,
}

impl ConsumerStatus {
    /// Numeric code used in trace lines.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::NotArrived => -1,
            Self::Waiting => 0,
            Self::Running => 1,
            Self::Done => 2,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Staying in the same status is always allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotArrived, Self::NotArrived | Self::Waiting)
                | (Self::Waiting, Self::Waiting | Self::Running)
                | (Self::Running, Self::Running | Self::Waiting | Self::Done)
                | (Self::Done, Self::Done)
        )
    }
}

impl fmt::Display for ConsumerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A consumer entry in the pending set or the waiting queue.
///
/// A consumer starts as a single entry. Preemption pushes an additional entry
/// for the same id that only covers the preempted pool, with the leftover
/// time as its burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    /// Identity shared by every entry of the same consumer.
    pub id: ConsumerId,
    /// Group tag.
    pub group: String,
    /// Pools still to be satisfied, in order. Shrinks as slots are granted.
    pub required_pools: Vec<String>,
    /// Service time per pool; the SJF sort key.
    pub burst: Duration,
    /// Priority (lower is more urgent).
    pub priority: Priority,
    /// Arrival offset from the start of the run.
    pub arrival_time: Duration,
    /// Time still owed. Equals `burst` except on preemption entries.
    pub remaining_time: Duration,
}

impl Consumer {
    /// Create a fresh consumer with `remaining_time = burst`.
    pub fn new(
        id: impl Into<ConsumerId>,
        group: impl Into<String>,
        required_pools: Vec<String>,
        burst: Duration,
        priority: Priority,
        arrival_time: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            required_pools,
            burst,
            priority,
            arrival_time,
            remaining_time: burst,
        }
    }

    /// The entry pushed back to the waiting queue after this consumer was
    /// evicted from `pool` with `remaining` time left.
    #[must_use]
    pub fn resumed(&self, pool: &str, remaining: Duration) -> Self {
        Self {
            id: self.id.clone(),
            group: self.group.clone(),
            required_pools: vec![pool.to_string()],
            burst: remaining,
            priority: self.priority,
            arrival_time: self.arrival_time,
            remaining_time: remaining,
        }
    }

    /// Whether the consumer is admitted at `elapsed`. Consumers arriving at
    /// zero are admitted from the start.
    #[must_use]
    pub fn has_arrived(&self, elapsed: Duration) -> bool {
        self.arrival_time.is_zero() || elapsed > self.arrival_time
    }

    /// No pool left to acquire.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.required_pools.is_empty()
    }
}
