//! Admission engine: the SJF dispatch pass.
//!
//! One pass settles holds that ended, admits arrivals, re-sorts the waiting queue by ascending burst
//! (stable, so equal bursts keep their relative order), then walks the queue
//! and gives each entry at most one slot. The same skeleton serves both modes;
//! the [`PreemptionPolicy`] decides whether occupied slots are candidates.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::core::consumer::{Consumer, ConsumerId, ConsumerStatus};
use crate::core::occupancy::{try_lease, Occupancy, OccupancyRecord};
use crate::core::policy::{Placement, PreemptRule, PreemptionPolicy, RemainingEstimate};
use crate::core::state::SchedulerState;
use crate::core::SchedulerError;
use crate::util::clock::SharedClock;

/// An occupant removed to make room for a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction {
    /// Evicted consumer.
    pub consumer: ConsumerId,
    /// Unrounded time it still owed; becomes the burst of its new entry.
    pub remaining: Duration,
    /// Rule that allowed the eviction.
    pub rule: PreemptRule,
}

/// One slot assignment made by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Elapsed run time of the pass.
    pub at: Duration,
    /// Admitted consumer.
    pub consumer: ConsumerId,
    /// Pool name.
    pub pool: String,
    /// Slot index in the pool.
    pub slot: usize,
    /// Hold length granted.
    pub hold: Duration,
    /// Occupant evicted for this admission, if any.
    pub evicted: Option<Eviction>,
}

/// Counters for a single pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Holds that ended since the previous pass.
    pub finished: usize,
    /// Consumers moved from pending to waiting.
    pub arrived: usize,
    /// Slots assigned.
    pub admitted: usize,
    /// Occupants evicted.
    pub preempted: usize,
    /// Entries left in the waiting queue.
    pub waiting: usize,
}

/// SJF admission engine parameterized by a preemption policy.
#[derive(Debug)]
pub struct AdmissionEngine {
    policy: PreemptionPolicy,
    estimate: RemainingEstimate,
    clock: SharedClock,
    decisions: Vec<Admission>,
    passes: u64,
}

impl AdmissionEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(policy: PreemptionPolicy, estimate: RemainingEstimate, clock: SharedClock) -> Self {
        Self {
            policy,
            estimate,
            clock,
            decisions: Vec::new(),
            passes: 0,
        }
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> PreemptionPolicy {
        self.policy
    }

    /// Every admission made so far, in order.
    #[must_use]
    pub fn decisions(&self) -> &[Admission] {
        &self.decisions
    }

    /// Number of passes run.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one scheduling pass.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::Configuration`] if an entry names an unknown pool
    ///   (not reachable for states built by [`SchedulerState::new`]).
    /// - [`SchedulerError::Spawn`] if a hold thread cannot be started.
    pub fn pass(&mut self, state: &mut SchedulerState) -> Result<PassReport, SchedulerError> {
        self.passes += 1;
        let now = self.clock.now();
        let elapsed = state.elapsed(now);

        let finished = state.reconcile(now);
        let mut report = PassReport {
            finished: finished.len(),
            arrived: admit_arrivals(state, elapsed),
            ..PassReport::default()
        };
        state.waiting.sort_by_key(|entry| entry.burst);

        // Evicted occupants are appended while walking and get their turn in
        // this same pass.
        let mut idx = 0;
        while idx < state.waiting.len() {
            if let Some(admission) = self.place_entry(state, idx, now, elapsed)? {
                report.admitted += 1;
                if admission.evicted.is_some() {
                    report.preempted += 1;
                }
                self.decisions.push(admission);
            }
            idx += 1;
        }

        state.waiting.retain(|entry| !entry.is_satisfied());
        report.waiting = state.waiting.len();
        trace!(pass = self.passes, ?report, "pass finished");
        Ok(report)
    }

    fn place_entry(
        &self,
        state: &mut SchedulerState,
        idx: usize,
        now: Duration,
        elapsed: Duration,
    ) -> Result<Option<Admission>, SchedulerError> {
        let id = state.waiting[idx].id.clone();
        let Some(lease) = state.lock_of(&id).and_then(try_lease) else {
            trace!(consumer = %id, "consumer busy, skipped");
            return Ok(None);
        };

        for j in 0..state.waiting[idx].required_pools.len() {
            let pool_name = state.waiting[idx].required_pools[j].clone();
            let pool = state.pool_position(&pool_name).ok_or_else(|| {
                SchedulerError::Configuration {
                    consumers: vec![id.clone()],
                    pools: vec![pool_name.clone()],
                }
            })?;

            let Some(placement) =
                self.policy
                    .place(&state.pools[pool], &state.waiting[idx], now, self.estimate)
            else {
                continue;
            };

            let slot = placement.slot();
            let evicted = match placement {
                Placement::Free(_) => {
                    state.reconcile_slot(pool, slot, now);
                    None
                }
                Placement::Preempt { rule, .. } => evict(state, pool, slot, rule, now),
            };

            let entry = &mut state.waiting[idx];
            entry.required_pools.remove(j);
            let hold = entry.remaining_time;
            let record = OccupancyRecord {
                consumer: id.clone(),
                pool: pool_name.clone(),
                slot,
                started_at: now,
                hold,
                priority: entry.priority,
            };
            let occupancy = Occupancy::start(record, lease, Arc::clone(&self.clock))?;
            state.install(pool, slot, occupancy);
            state.set_status(&id, ConsumerStatus::Running);

            info!(
                consumer = %id,
                pool = %pool_name,
                slot,
                hold_ms = hold.as_millis(),
                elapsed_ms = elapsed.as_millis(),
                preempted = evicted.as_ref().map(|e| e.consumer.as_str()),
                "consumer admitted"
            );

            return Ok(Some(Admission {
                at: elapsed,
                consumer: id,
                pool: pool_name,
                slot,
                hold,
                evicted,
            }));
        }

        trace!(consumer = %id, "no slot available");
        Ok(None)
    }
}

/// Move arrived consumers from pending to waiting. Returns how many moved.
fn admit_arrivals(state: &mut SchedulerState, elapsed: Duration) -> usize {
    let (arrived, pending): (Vec<Consumer>, Vec<Consumer>) = std::mem::take(&mut state.pending)
        .into_iter()
        .partition(|c| c.has_arrived(elapsed));
    state.pending = pending;

    let count = arrived.len();
    for consumer in arrived {
        debug!(consumer = %consumer.id, elapsed_ms = elapsed.as_millis(), "consumer arrived");
        state.set_status(&consumer.id, ConsumerStatus::Waiting);
        state.waiting.push(consumer);
    }
    count
}

/// Cancel the occupant of `slot` and queue its leftover work. Returns `None`
/// if the hold ended on its own first; the slot is then treated as free.
fn evict(
    state: &mut SchedulerState,
    pool: usize,
    slot: usize,
    rule: PreemptRule,
    now: Duration,
) -> Option<Eviction> {
    let cancelled = state.pools[pool].slots()[slot]
        .occupancy()
        .and_then(|occ| occ.cancel(now).map(|left| (occ.record().clone(), left)));

    let Some((record, remaining)) = cancelled else {
        state.reconcile_slot(pool, slot, now);
        return None;
    };

    if let Some(profile) = state.profile(&record.consumer) {
        let resumed = profile.resumed(&record.pool, remaining);
        state.waiting.push(resumed);
    }
    state.set_status(&record.consumer, ConsumerStatus::Waiting);

    info!(
        consumer = %record.consumer,
        pool = %record.pool,
        slot,
        remaining_ms = remaining.as_millis(),
        ?rule,
        "occupant preempted"
    );

    Some(Eviction {
        consumer: record.consumer,
        remaining,
        rule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resource_pool::ResourcePool;
    use crate::util::clock::{Clock, VirtualClock};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn student(id: &str, pools: &[&str], burst: u64, priority: i64, arrival: u64) -> Consumer {
        Consumer::new(
            id,
            "G1",
            pools.iter().map(|p| (*p).to_string()).collect(),
            ms(burst),
            priority,
            ms(arrival),
        )
    }

    fn setup(
        policy: PreemptionPolicy,
        pools: Vec<ResourcePool>,
        consumers: Vec<Consumer>,
    ) -> (Arc<VirtualClock>, AdmissionEngine, SchedulerState) {
        let (clock, shared) = VirtualClock::shared();
        let state = SchedulerState::new(pools, consumers, clock.now()).unwrap();
        let engine = AdmissionEngine::new(policy, RemainingEstimate::Continuous, shared);
        (clock, engine, state)
    }

    #[test]
    fn test_shortest_burst_first() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::None,
            vec![ResourcePool::with_capacity("D1", 1)],
            vec![student("A", &["D1"], 50, 1, 0), student("B", &["D1"], 10, 1, 0)],
        );

        let report = engine.pass(&mut state).unwrap();
        assert_eq!(report.admitted, 1);
        assert_eq!(engine.decisions()[0].consumer, "B");
        assert_eq!(state.status("B"), Some(ConsumerStatus::Running));
        assert_eq!(state.status("A"), Some(ConsumerStatus::Waiting));

        clock.advance(ms(10));
        engine.pass(&mut state).unwrap();
        assert_eq!(engine.decisions()[1].consumer, "A");
        assert_eq!(state.status("B"), Some(ConsumerStatus::Done));

        clock.advance(ms(50));
        engine.pass(&mut state).unwrap();
        assert_eq!(state.status("A"), Some(ConsumerStatus::Done));
        assert!(state.all_admitted());
        state.shutdown(clock.now());
    }

    #[test]
    fn test_lower_priority_occupant_is_evicted() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::PriorityAndBurst,
            vec![ResourcePool::with_capacity("D1", 1)],
            vec![student("C", &["D1"], 100, 2, 0), student("D", &["D1"], 20, 1, 10)],
        );

        engine.pass(&mut state).unwrap();
        clock.advance(ms(15));
        let report = engine.pass(&mut state).unwrap();
        assert_eq!(report.arrived, 1);
        assert_eq!(report.preempted, 1);

        let admission = &engine.decisions()[1];
        assert_eq!(admission.consumer, "D");
        let evicted = admission.evicted.as_ref().unwrap();
        assert_eq!(evicted.consumer, "C");
        assert_eq!(evicted.remaining, ms(85));
        assert_eq!(evicted.rule, PreemptRule::LowerPriority);

        assert_eq!(state.status("C"), Some(ConsumerStatus::Waiting));
        assert_eq!(state.waiting().len(), 1);
        assert_eq!(state.waiting()[0].burst, ms(85));
        assert_eq!(state.waiting()[0].required_pools, vec!["D1".to_string()]);

        // C resumes once D is done and finishes its leftover time.
        clock.advance(ms(20));
        engine.pass(&mut state).unwrap();
        assert_eq!(state.status("D"), Some(ConsumerStatus::Done));
        assert_eq!(engine.decisions()[2].hold, ms(85));
        clock.advance(ms(85));
        engine.pass(&mut state).unwrap();
        assert_eq!(state.status("C"), Some(ConsumerStatus::Done));
        state.shutdown(clock.now());
    }

    #[test]
    fn test_non_preemptive_never_evicts() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::None,
            vec![ResourcePool::with_capacity("D1", 1)],
            vec![student("C", &["D1"], 100, 2, 0), student("D", &["D1"], 20, 1, 10)],
        );

        engine.pass(&mut state).unwrap();
        clock.advance(ms(15));
        let report = engine.pass(&mut state).unwrap();
        assert_eq!(report.admitted, 0);
        assert_eq!(state.status("C"), Some(ConsumerStatus::Running));
        assert_eq!(state.status("D"), Some(ConsumerStatus::Waiting));
        state.shutdown(clock.now());
    }

    #[test]
    fn test_equal_priority_longer_remaining_is_evicted() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::PriorityAndBurst,
            vec![ResourcePool::with_capacity("D1", 1)],
            vec![student("L", &["D1"], 100, 1, 0), student("S", &["D1"], 30, 1, 5)],
        );

        engine.pass(&mut state).unwrap();
        clock.advance(ms(10));
        engine.pass(&mut state).unwrap();

        let evicted = engine.decisions()[1].evicted.clone().unwrap();
        assert_eq!(evicted.consumer, "L");
        assert_eq!(evicted.rule, PreemptRule::LongerRemaining);
        assert_eq!(evicted.remaining, ms(90));
        state.shutdown(clock.now());
    }

    #[test]
    fn test_equal_priority_shorter_remaining_is_kept() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::PriorityAndBurst,
            vec![ResourcePool::with_capacity("D1", 1)],
            vec![student("L", &["D1"], 40, 1, 0), student("S", &["D1"], 30, 1, 5)],
        );

        engine.pass(&mut state).unwrap();
        clock.advance(ms(20));
        let report = engine.pass(&mut state).unwrap();
        assert_eq!(report.preempted, 0);
        assert_eq!(state.status("L"), Some(ConsumerStatus::Running));
        state.shutdown(clock.now());
    }

    #[test]
    fn test_one_slot_per_consumer_at_a_time() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::None,
            vec![
                ResourcePool::with_capacity("D1", 1),
                ResourcePool::with_capacity("D2", 1),
            ],
            vec![student("S1", &["D1", "D2"], 10, 1, 0)],
        );

        engine.pass(&mut state).unwrap();
        let report = engine.pass(&mut state).unwrap();
        assert_eq!(report.admitted, 0);
        assert_eq!(state.active_occupancies_of("S1", clock.now()), 1);

        clock.advance(ms(10));
        engine.pass(&mut state).unwrap();
        assert_eq!(engine.decisions()[1].pool, "D2");
        assert_eq!(state.status("S1"), Some(ConsumerStatus::Running));

        clock.advance(ms(10));
        let report = engine.pass(&mut state).unwrap();
        assert_eq!(report.finished, 1);
        assert_eq!(state.status("S1"), Some(ConsumerStatus::Done));
        state.shutdown(clock.now());
    }

    #[test]
    fn test_arrival_needs_strictly_later_time() {
        let (clock, mut engine, mut state) = setup(
            PreemptionPolicy::None,
            vec![ResourcePool::with_capacity("D1", 1)],
            vec![student("S1", &["D1"], 10, 1, 20)],
        );

        clock.advance(ms(20));
        assert_eq!(engine.pass(&mut state).unwrap().arrived, 0);
        assert_eq!(state.status("S1"), Some(ConsumerStatus::NotArrived));

        clock.advance(ms(1));
        assert_eq!(engine.pass(&mut state).unwrap().arrived, 1);
        assert_eq!(state.status("S1"), Some(ConsumerStatus::Running));
        assert_eq!(engine.passes(), 2);
        state.shutdown(clock.now());
    }
}
