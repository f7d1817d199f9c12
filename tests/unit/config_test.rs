//! Tests for scenario configuration

use std::time::Duration;

use sjf_exam_sim::config::{ScenarioConfig, SchedulingMode};
use sjf_exam_sim::core::{PreemptionPolicy, RemainingEstimate};

const FULL: &str = r#"{
    "quantum_ms": 50,
    "mode": "preemptive",
    "remaining_estimate": "quantum_rounded",
    "poll_interval_ms": 5,
    "professors": [
        {"name": "Ivanov", "discipline": "Math", "capacity": 2},
        {"name": "Petrov", "discipline": "Physics", "capacity": 1}
    ],
    "consumers": [
        {"id": "S1", "group": "G7", "pools": ["Math", "Physics"], "burst_ms": 120, "priority": 3, "arrival_ms": 40}
    ]
}"#;

#[test]
fn test_full_scenario_parses() {
    let cfg = ScenarioConfig::from_json_str(FULL).unwrap();
    assert_eq!(cfg.quantum(), Duration::from_millis(50));
    assert_eq!(cfg.mode, SchedulingMode::Preemptive);
    assert_eq!(cfg.policy(), PreemptionPolicy::PriorityAndBurst);
    assert_eq!(cfg.remaining_estimate, RemainingEstimate::QuantumRounded);
    assert_eq!(cfg.poll_interval(), Duration::from_millis(5));
    assert_eq!(cfg.disciplines(), vec!["Math", "Physics"]);

    let consumer = &cfg.to_consumers()[0];
    assert_eq!(consumer.group, "G7");
    assert_eq!(consumer.arrival_time, Duration::from_millis(40));
}

#[test]
fn test_mode_defaults_to_preemptive() {
    let cfg = ScenarioConfig::from_json_str(
        r#"{"quantum_ms": 10, "professors": [{"name": "P1", "discipline": "D1", "capacity": 1}]}"#,
    )
    .unwrap();
    assert_eq!(cfg.mode, SchedulingMode::Preemptive);
    assert!(cfg.consumers.is_empty());
}

#[test]
fn test_unknown_mode_is_rejected() {
    let err = ScenarioConfig::from_json_str(
        r#"{"quantum_ms": 10, "mode": "round_robin", "professors": []}"#,
    )
    .unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_zero_quantum_is_rejected() {
    let err = ScenarioConfig::from_json_str(
        r#"{"quantum_ms": 0, "professors": [{"name": "P1", "discipline": "D1", "capacity": 1}]}"#,
    )
    .unwrap_err();
    assert!(err.contains("quantum_ms"));
}

#[test]
fn test_round_trips_through_json() {
    let cfg = ScenarioConfig::from_json_str(FULL).unwrap();
    let text = serde_json::to_string(&cfg).unwrap();
    assert_eq!(ScenarioConfig::from_json_str(&text).unwrap(), cfg);
}
