//! Builders to construct a driver from scenario configuration.

use tracing::debug;

use crate::config::{ProfessorConfig, ScenarioConfig};
use crate::core::{AdmissionEngine, Driver, ResourcePool, SchedulerError, SchedulerState, TraceSink, Tracer};
use crate::util::clock::SharedClock;

/// One pool per discipline, in order of first appearance. Professors sharing
/// a discipline contribute their slots to the same pool, each slot labelled
/// with its professor's name.
#[must_use]
pub fn build_pools(professors: &[ProfessorConfig]) -> Vec<ResourcePool> {
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    for professor in professors {
        let labels = std::iter::repeat(professor.name.clone()).take(professor.capacity);
        match groups.iter_mut().find(|(name, _)| *name == professor.discipline) {
            Some((_, slots)) => slots.extend(labels),
            None => groups.push((professor.discipline.as_str(), labels.collect())),
        }
    }
    groups
        .into_iter()
        .map(|(name, labels)| ResourcePool::new(name, labels))
        .collect()
}

/// Validate `cfg` and assemble a driver that reports to `sinks`.
///
/// # Errors
///
/// - [`SchedulerError::InvalidScenario`] when validation fails.
/// - [`SchedulerError::Configuration`] when consumers require disciplines no
///   professor offers. No scheduling pass runs in that case.
pub fn build_driver(
    cfg: &ScenarioConfig,
    clock: SharedClock,
    sinks: Vec<Box<dyn TraceSink>>,
) -> Result<Driver, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidScenario)?;

    let pools = build_pools(&cfg.professors);
    debug!(pools = pools.len(), consumers = cfg.consumers.len(), "building driver");
    let state = SchedulerState::new(pools, cfg.to_consumers(), clock.now())?;

    let engine = AdmissionEngine::new(cfg.policy(), cfg.remaining_estimate, clock.clone());
    let tracer = sinks
        .into_iter()
        .fold(Tracer::new(cfg.quantum(), clock.clone()), Tracer::with_sink);

    Ok(Driver::new(state, engine, tracer, clock, cfg.poll_interval()))
}
