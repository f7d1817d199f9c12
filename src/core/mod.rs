//! Core scheduling: pools, consumers, admission and tracing.

pub mod consumer;
pub mod driver;
pub mod engine;
pub mod error;
pub mod occupancy;
pub mod policy;
pub mod resource_pool;
pub mod state;
pub mod tracer;

pub use consumer::{Consumer, ConsumerId, ConsumerStatus, Priority};
pub use driver::{Driver, Phase, RunSummary};
pub use engine::{Admission, AdmissionEngine, Eviction, PassReport};
pub use error::{AppResult, SchedulerError};
pub use occupancy::{HoldPhase, Occupancy, OccupancyRecord};
pub use policy::{Placement, PreemptRule, PreemptionPolicy, RemainingEstimate};
pub use resource_pool::{ResourcePool, Slot};
pub use state::SchedulerState;
pub use tracer::{Snapshot, SlotView, TraceSink, Tracer};
