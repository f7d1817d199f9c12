//! Tests for error types

use sjf_exam_sim::core::{AppResult, SchedulerError};

#[test]
fn test_invalid_scenario_error() {
    let err = SchedulerError::InvalidScenario("quantum_ms must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid scenario: quantum_ms must be greater than 0");
}

#[test]
fn test_race_error() {
    let err = SchedulerError::Race("S3".to_string());
    assert_eq!(format!("{}", err), "occupancy race on consumer S3");
}

#[test]
fn test_sink_error() {
    let err = SchedulerError::Sink("broken pipe".to_string());
    assert_eq!(format!("{}", err), "trace sink error: broken pipe");
}

#[test]
fn test_spawn_error() {
    let err = SchedulerError::Spawn("resource temporarily unavailable".to_string());
    assert_eq!(
        format!("{}", err),
        "failed to spawn hold thread: resource temporarily unavailable"
    );
}

#[test]
fn test_errors_convert_into_app_result() {
    fn fails() -> AppResult<()> {
        Err(SchedulerError::Scenario {
            line: 3,
            reason: "invalid quantum `x`".into(),
        })?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.to_string(), "scenario line 3: invalid quantum `x`");
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
