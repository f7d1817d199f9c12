//! Scenario configuration: professors, consumers and run parameters.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Consumer, PreemptionPolicy, Priority, RemainingEstimate};

/// Which admission mode to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Occupants always run to completion.
    NonPreemptive,
    /// Higher-precedence arrivals may evict occupants.
    #[default]
    Preemptive,
}

impl SchedulingMode {
    /// Name of the report file written for this mode.
    #[must_use]
    pub const fn output_file_name(self) -> &'static str {
        match self {
            Self::NonPreemptive => "output_nonpreemptive.txt",
            Self::Preemptive => "output_preemptive.txt",
        }
    }
}

impl From<SchedulingMode> for PreemptionPolicy {
    fn from(mode: SchedulingMode) -> Self {
        match mode {
            SchedulingMode::NonPreemptive => Self::None,
            SchedulingMode::Preemptive => Self::PriorityAndBurst,
        }
    }
}

/// A professor contributing `capacity` slots to one discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorConfig {
    /// Professor name; labels its slots.
    pub name: String,
    /// Discipline (pool) the slots belong to.
    pub discipline: String,
    /// Number of slots.
    pub capacity: usize,
}

/// A student as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Unique id.
    pub id: String,
    /// Group tag.
    #[serde(default = "default_group")]
    pub group: String,
    /// Disciplines required, in order.
    pub pools: Vec<String>,
    /// Service time per discipline in milliseconds.
    pub burst_ms: u64,
    /// Priority (lower is more urgent).
    pub priority: Priority,
    /// Arrival offset in milliseconds.
    #[serde(default)]
    pub arrival_ms: u64,
}

fn default_group() -> String {
    "G1".to_string()
}

impl ConsumerConfig {
    /// Build the core consumer.
    #[must_use]
    pub fn to_consumer(&self) -> Consumer {
        Consumer::new(
            self.id.clone(),
            self.group.clone(),
            self.pools.clone(),
            Duration::from_millis(self.burst_ms),
            self.priority,
            Duration::from_millis(self.arrival_ms),
        )
    }
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Snapshot period in milliseconds.
    pub quantum_ms: u64,
    /// Admission mode.
    #[serde(default)]
    pub mode: SchedulingMode,
    /// Remaining-time measure used by the equal-priority preemption rule.
    #[serde(default)]
    pub remaining_estimate: RemainingEstimate,
    /// Sleep between driver polls; defaults to a tenth of the quantum.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Professors in declaration order.
    pub professors: Vec<ProfessorConfig>,
    /// Students in declaration order.
    #[serde(default)]
    pub consumers: Vec<ConsumerConfig>,
}

impl ScenarioConfig {
    /// Snapshot period.
    #[must_use]
    pub const fn quantum(&self) -> Duration {
        Duration::from_millis(self.quantum_ms)
    }

    /// Effective poll interval, never below one millisecond.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        let ms = self.poll_interval_ms.unwrap_or(self.quantum_ms / 10);
        Duration::from_millis(ms.max(1))
    }

    /// Preemption policy selected by the mode.
    #[must_use]
    pub fn policy(&self) -> PreemptionPolicy {
        self.mode.into()
    }

    /// Core consumers in declaration order.
    #[must_use]
    pub fn to_consumers(&self) -> Vec<Consumer> {
        self.consumers.iter().map(ConsumerConfig::to_consumer).collect()
    }

    /// Disciplines in order of first appearance among the professors.
    #[must_use]
    pub fn disciplines(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for professor in &self.professors {
            if !seen.contains(&professor.discipline.as_str()) {
                seen.push(professor.discipline.as_str());
            }
        }
        seen
    }

    /// Validate run parameters, professors and consumers. Unknown disciplines
    /// are not checked here; they surface as a configuration error when the
    /// scheduler is built.
    pub fn validate(&self) -> Result<(), String> {
        if self.quantum_ms == 0 {
            return Err("quantum_ms must be greater than 0".into());
        }
        match self.poll_interval_ms {
            Some(0) => return Err("poll_interval_ms must be greater than 0".into()),
            Some(ms) if ms > self.quantum_ms => {
                return Err("poll_interval_ms must not exceed quantum_ms".into());
            }
            _ => {}
        }
        if self.professors.is_empty() {
            return Err("at least one professor must be defined".into());
        }
        for professor in &self.professors {
            if professor.discipline.trim().is_empty() {
                return Err(format!("professor `{}` has no discipline", professor.name));
            }
            if professor.capacity == 0 {
                return Err(format!(
                    "professor `{}` capacity must be greater than 0",
                    professor.name
                ));
            }
        }

        let mut ids = HashSet::with_capacity(self.consumers.len());
        for consumer in &self.consumers {
            if !ids.insert(consumer.id.as_str()) {
                return Err(format!("consumer `{}` defined twice", consumer.id));
            }
            if consumer.pools.is_empty() {
                return Err(format!("consumer `{}` requires no discipline", consumer.id));
            }
            if consumer.burst_ms == 0 {
                return Err(format!("consumer `{}` burst_ms must be greater than 0", consumer.id));
            }
        }
        Ok(())
    }

    /// Parse a scenario from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
