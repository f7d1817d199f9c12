//! Scheduler state shared by the admission engine and the tracer.
//!
//! All mutation happens on the scheduling loop's thread. The only state touched
//! by other threads lives inside each [`Occupancy`] and the per-consumer locks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, warn};

use crate::core::consumer::{Consumer, ConsumerId, ConsumerStatus};
use crate::core::occupancy::{ConsumerLock, HoldPhase, Occupancy};
use crate::core::resource_pool::ResourcePool;
use crate::core::SchedulerError;

/// Pools, consumer queues and statuses for one run.
#[derive(Debug)]
pub struct SchedulerState {
    pub(crate) pools: Vec<ResourcePool>,
    pool_index: HashMap<String, usize>,
    /// Consumer ids in configuration order; fixes trace column order.
    order: Vec<ConsumerId>,
    status: HashMap<ConsumerId, ConsumerStatus>,
    /// Consumers as configured; source of resumed entries after preemption.
    profiles: HashMap<ConsumerId, Consumer>,
    locks: HashMap<ConsumerId, ConsumerLock>,
    pub(crate) pending: Vec<Consumer>,
    pub(crate) waiting: Vec<Consumer>,
    pub(crate) quantum_index: u64,
    started_at: Duration,
    retired: Vec<JoinHandle<()>>,
}

impl SchedulerState {
    /// Validate the scenario and build the initial state. Consumers arriving at
    /// zero start in the waiting queue, the rest are pending.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::InvalidScenario`] for structural problems (no pools,
    ///   empty or duplicate pools, duplicate consumers, empty requirement
    ///   lists, zero bursts).
    /// - [`SchedulerError::Configuration`] when consumers require pools that
    ///   are not configured.
    pub fn new(
        pools: Vec<ResourcePool>,
        consumers: Vec<Consumer>,
        started_at: Duration,
    ) -> Result<Self, SchedulerError> {
        if pools.is_empty() {
            return Err(SchedulerError::InvalidScenario(
                "at least one pool must be defined".into(),
            ));
        }

        let mut pool_index = HashMap::with_capacity(pools.len());
        for (idx, pool) in pools.iter().enumerate() {
            if pool.capacity() == 0 {
                return Err(SchedulerError::InvalidScenario(format!(
                    "pool `{}` has no slots",
                    pool.name()
                )));
            }
            if pool_index.insert(pool.name().to_string(), idx).is_some() {
                return Err(SchedulerError::InvalidScenario(format!(
                    "pool `{}` defined twice",
                    pool.name()
                )));
            }
        }

        let mut seen = HashSet::with_capacity(consumers.len());
        for consumer in &consumers {
            if !seen.insert(consumer.id.as_str()) {
                return Err(SchedulerError::InvalidScenario(format!(
                    "consumer `{}` defined twice",
                    consumer.id
                )));
            }
            if consumer.required_pools.is_empty() {
                return Err(SchedulerError::InvalidScenario(format!(
                    "consumer `{}` requires no pools",
                    consumer.id
                )));
            }
            if consumer.burst.is_zero() {
                return Err(SchedulerError::InvalidScenario(format!(
                    "consumer `{}` has a zero burst",
                    consumer.id
                )));
            }
        }

        check_pools_exist(&pool_index, &consumers)?;

        let order: Vec<ConsumerId> = consumers.iter().map(|c| c.id.clone()).collect();
        let locks = order
            .iter()
            .map(|id| (id.clone(), Arc::new(Mutex::new(()))))
            .collect();

        let profiles = consumers.iter().map(|c| (c.id.clone(), c.clone())).collect();
        let mut status = HashMap::with_capacity(consumers.len());
        let mut pending = Vec::new();
        let mut waiting = Vec::new();
        for consumer in consumers {
            if consumer.has_arrived(Duration::ZERO) {
                status.insert(consumer.id.clone(), ConsumerStatus::Waiting);
                waiting.push(consumer);
            } else {
                status.insert(consumer.id.clone(), ConsumerStatus::NotArrived);
                pending.push(consumer);
            }
        }

        Ok(Self {
            pools,
            pool_index,
            order,
            status,
            profiles,
            locks,
            pending,
            waiting,
            quantum_index: 0,
            started_at,
            retired: Vec::new(),
        })
    }

    /// Pools in configuration order.
    #[must_use]
    pub fn pools(&self) -> &[ResourcePool] {
        &self.pools
    }

    pub(crate) fn pool_position(&self, name: &str) -> Option<usize> {
        self.pool_index.get(name).copied()
    }

    /// Consumer ids in configuration order.
    #[must_use]
    pub fn consumer_order(&self) -> &[ConsumerId] {
        &self.order
    }

    /// Status of one consumer.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<ConsumerStatus> {
        self.status.get(id).copied()
    }

    /// Every status in configuration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<(ConsumerId, ConsumerStatus)> {
        self.order
            .iter()
            .map(|id| {
                let status = self.status.get(id).copied().unwrap_or(ConsumerStatus::NotArrived);
                (id.clone(), status)
            })
            .collect()
    }

    /// Entries waiting for a slot, in current queue order.
    #[must_use]
    pub fn waiting(&self) -> &[Consumer] {
        &self.waiting
    }

    /// Consumers that have not arrived yet.
    #[must_use]
    pub fn pending(&self) -> &[Consumer] {
        &self.pending
    }

    /// Number of natural quantum crossings seen so far.
    #[must_use]
    pub const fn quantum_index(&self) -> u64 {
        self.quantum_index
    }

    /// Time elapsed since the start of the run.
    #[must_use]
    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
    }

    /// A consumer as it was configured.
    #[must_use]
    pub fn profile(&self, id: &str) -> Option<&Consumer> {
        self.profiles.get(id)
    }

    pub(crate) fn lock_of(&self, id: &str) -> Option<&ConsumerLock> {
        self.locks.get(id)
    }

    /// Whether any entry of `id` is waiting or pending.
    #[must_use]
    pub fn is_queued(&self, id: &str) -> bool {
        self.waiting.iter().chain(self.pending.iter()).any(|c| c.id == id)
    }

    /// Both the pending set and the waiting queue are empty.
    #[must_use]
    pub fn all_admitted(&self) -> bool {
        self.pending.is_empty() && self.waiting.is_empty()
    }

    /// Whether any slot is held at `now`.
    #[must_use]
    pub fn has_active_occupancy(&self, now: Duration) -> bool {
        self.pools
            .iter()
            .any(|pool| pool.slots().iter().any(|slot| slot.is_active(now)))
    }

    /// Number of slots `id` holds at `now`.
    #[must_use]
    pub fn active_occupancies_of(&self, id: &str, now: Duration) -> usize {
        self.pools
            .iter()
            .flat_map(ResourcePool::slots)
            .filter(|slot| slot.active_occupant(now).is_some_and(|occ| occ == id))
            .count()
    }

    /// Apply a status change, refusing transitions the lifecycle forbids.
    pub(crate) fn set_status(&mut self, id: &str, next: ConsumerStatus) {
        let Some(current) = self.status.get_mut(id) else {
            warn!(consumer = id, "status update for unknown consumer");
            return;
        };
        if !current.can_transition_to(next) {
            error!(
                consumer = id,
                from = ?*current,
                to = ?next,
                "illegal status transition ignored"
            );
            return;
        }
        *current = next;
    }

    /// Settle every occupancy that finished since the last poll and update the
    /// status of its former occupant. Returns the occupants that were resolved.
    pub(crate) fn reconcile(&mut self, now: Duration) -> Vec<ConsumerId> {
        let mut finished = Vec::new();
        for pool in 0..self.pools.len() {
            for slot in 0..self.pools[pool].capacity() {
                if let Some(id) = self.settle_slot(pool, slot, now) {
                    finished.push(id);
                }
            }
        }
        for id in &finished {
            self.resolve(id, now);
        }
        finished
    }

    /// Settle and resolve a single slot ahead of reuse.
    pub(crate) fn reconcile_slot(&mut self, pool: usize, slot: usize, now: Duration) {
        if let Some(id) = self.settle_slot(pool, slot, now) {
            self.resolve(&id, now);
        }
    }

    fn settle_slot(&mut self, pool: usize, slot: usize, now: Duration) -> Option<ConsumerId> {
        let occ = self.pools[pool].slots_mut()[slot].occupancy_mut()?;
        if occ.is_reconciled() || occ.is_active(now) {
            return None;
        }
        occ.settle(now);
        occ.mark_reconciled();
        Some(occ.record().consumer.clone())
    }

    /// Derive a consumer's status from its occupancies and queue entries.
    fn resolve(&mut self, id: &str, now: Duration) {
        match self.active_occupancies_of(id, now) {
            0 if self.is_queued(id) => self.set_status(id, ConsumerStatus::Waiting),
            0 => self.set_status(id, ConsumerStatus::Done),
            1 => self.set_status(id, ConsumerStatus::Running),
            live => {
                let err = SchedulerError::Race(id.to_string());
                error!(consumer = id, live, error = %err, "leaving consumer state unresolved");
            }
        }
    }

    /// Put `occupancy` into a slot; the replaced occupancy's thread is kept
    /// for joining at shutdown.
    pub(crate) fn install(&mut self, pool: usize, slot: usize, occupancy: Occupancy) {
        if let Some(mut old) = self.pools[pool].slots_mut()[slot].install(occupancy) {
            if let Some(handle) = old.take_handle() {
                self.retired.push(handle);
            }
        }
    }

    /// End every hold still in progress and join all hold threads.
    pub(crate) fn shutdown(&mut self, now: Duration) {
        for pool in &mut self.pools {
            for slot in pool.slots_mut() {
                if let Some(occ) = slot.occupancy_mut() {
                    // Nothing is resumed after shutdown, so the leftover time is dropped.
                    if occ.settle(now) == HoldPhase::Holding {
                        occ.cancel(now);
                    }
                    if let Some(handle) = occ.take_handle() {
                        self.retired.push(handle);
                    }
                }
            }
        }
        for handle in self.retired.drain(..) {
            if handle.join().is_err() {
                warn!("hold thread panicked");
            }
        }
    }
}

fn check_pools_exist(
    pool_index: &HashMap<String, usize>,
    consumers: &[Consumer],
) -> Result<(), SchedulerError> {
    let mut offenders = Vec::new();
    let mut missing: Vec<String> = Vec::new();
    for consumer in consumers {
        let mut offends = false;
        for pool in &consumer.required_pools {
            if !pool_index.contains_key(pool) {
                offends = true;
                if !missing.contains(pool) {
                    missing.push(pool.clone());
                }
            }
        }
        if offends {
            offenders.push(consumer.id.clone());
        }
    }
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(SchedulerError::Configuration {
            consumers: offenders,
            pools: missing,
        })
    }
}
