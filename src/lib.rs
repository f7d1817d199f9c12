//! # SJF Exam Simulator
//!
//! Shortest-Job-First scheduling of students (consumers) onto professors'
//! exam slots (pools), with a preemptive and a non-preemptive admission mode.
//!
//! Each discipline is a [`core::ResourcePool`] with a fixed number of slots.
//! Every occupied slot is held by its own OS thread for the student's burst,
//! while a single scheduling loop admits arrivals, sorts the waiting queue by
//! burst, assigns free slots and, in preemptive mode, evicts occupants that
//! a more urgent student outranks. A quantum tracer records the state of every
//! slot and every student once per quantum.
//!
//! ## Running a scenario
//!
//! ```rust
//! use std::time::Duration;
//!
//! use sjf_exam_sim::builders::build_driver;
//! use sjf_exam_sim::config::ScenarioConfig;
//! use sjf_exam_sim::core::ConsumerStatus;
//! use sjf_exam_sim::infra::sink::MemorySink;
//! use sjf_exam_sim::util::VirtualClock;
//!
//! let cfg = ScenarioConfig::from_json_str(r#"{
//!     "quantum_ms": 10,
//!     "mode": "non_preemptive",
//!     "professors": [{"name": "P1", "discipline": "D1", "capacity": 1}],
//!     "consumers": [
//!         {"id": "A", "pools": ["D1"], "burst_ms": 30, "priority": 1},
//!         {"id": "B", "pools": ["D1"], "burst_ms": 20, "priority": 1}
//!     ]
//! }"#)?;
//!
//! let (_, clock) = VirtualClock::shared();
//! let sink = MemorySink::unbounded();
//! let summary = build_driver(&cfg, clock, vec![Box::new(sink.clone())])?.run()?;
//!
//! assert_eq!(summary.decisions[0].consumer, "B");
//! assert!(summary.statuses.iter().all(|(_, s)| *s == ConsumerStatus::Done));
//! assert_eq!(sink.snapshots().len(), summary.snapshots);
//! assert!(summary.elapsed >= Duration::from_millis(50));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The `sjf-sim` binary wraps the same flow: it reads a scenario (JSON or the
//! line-oriented format), runs it on the wall clock and writes a report.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: pools, consumers, admission and tracing.
pub mod core;
/// Configuration models for scenarios.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters: trace sinks and the scenario file loader.
pub mod infra;
/// Report rendering.
pub mod report;
/// Shared utilities.
pub mod util;
