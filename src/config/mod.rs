//! Configuration models for scenarios.

pub mod scenario;

pub use scenario::{ConsumerConfig, ProfessorConfig, ScenarioConfig, SchedulingMode};
