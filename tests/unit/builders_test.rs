//! Tests for builder modules

use sjf_exam_sim::builders::{build_driver, build_pools};
use sjf_exam_sim::config::{ProfessorConfig, ScenarioConfig};
use sjf_exam_sim::core::{Phase, SchedulerError};
use sjf_exam_sim::util::VirtualClock;

fn professor(name: &str, discipline: &str, capacity: usize) -> ProfessorConfig {
    ProfessorConfig {
        name: name.into(),
        discipline: discipline.into(),
        capacity,
    }
}

#[test]
fn test_pools_follow_first_appearance() {
    let pools = build_pools(&[
        professor("P1", "D3", 1),
        professor("P2", "D1", 1),
        professor("P3", "D3", 2),
    ]);
    let names: Vec<_> = pools.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["D3", "D1"]);
    assert_eq!(pools[0].capacity(), 3);
}

#[test]
fn test_build_driver_rejects_invalid_scenario() {
    let cfg = ScenarioConfig::from_json_str(
        r#"{"quantum_ms": 10, "professors": [{"name": "P1", "discipline": "D1", "capacity": 1}]}"#,
    )
    .unwrap();
    let mut broken = cfg;
    broken.professors[0].capacity = 0;

    let (_, clock) = VirtualClock::shared();
    let err = build_driver(&broken, clock, Vec::new()).unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidScenario(_)));
}

#[test]
fn test_build_driver_starts_arriving() {
    let cfg = ScenarioConfig::from_json_str(
        r#"{
            "quantum_ms": 10,
            "professors": [{"name": "P1", "discipline": "D1", "capacity": 2}],
            "consumers": [{"id": "S1", "pools": ["D1"], "burst_ms": 10, "priority": 1, "arrival_ms": 5}]
        }"#,
    )
    .unwrap();
    let (_, clock) = VirtualClock::shared();
    let driver = build_driver(&cfg, clock, Vec::new()).unwrap();

    assert_eq!(driver.phase(), Phase::Arriving);
    assert_eq!(driver.state().pools()[0].capacity(), 2);
    assert_eq!(driver.state().pending().len(), 1);
}
