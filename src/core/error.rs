//! Error types for scheduler operations.

use thiserror::Error;

use super::consumer::ConsumerId;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Consumers require pools that no professor provides. Raised before any
    /// scheduling pass runs.
    #[error("configuration error: consumers {consumers:?} require unconfigured pools {pools:?}")]
    Configuration {
        /// Offending consumers, in configuration order.
        consumers: Vec<ConsumerId>,
        /// Pool names that are required but absent.
        pools: Vec<String>,
    },
    /// Scenario values are structurally invalid.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
    /// A consumer was observed with more than one active occupancy.
    #[error("occupancy race on consumer {0}")]
    Race(ConsumerId),
    /// An occupancy thread could not be started.
    #[error("failed to spawn hold thread: {0}")]
    Spawn(String),
    /// A trace sink rejected a record.
    #[error("trace sink error: {0}")]
    Sink(String),
    /// The scenario text could not be parsed.
    #[error("scenario line {line}: {reason}")]
    Scenario {
        /// One-based line number in the scenario file.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
