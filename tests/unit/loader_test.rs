//! Tests for the line-oriented scenario loader

use rand::rngs::StdRng;
use rand::SeedableRng;
use sjf_exam_sim::builders::build_driver;
use sjf_exam_sim::config::SchedulingMode;
use sjf_exam_sim::core::{ConsumerStatus, SchedulerError};
use sjf_exam_sim::infra::parse_scenario;
use sjf_exam_sim::util::VirtualClock;

const INPUT: &str = "\
1
10
40
3
2
P1
D1
1
P2
D2
2
3
S1
G1
D1 D2
30
2
0
S2
G2
D2
20
1
15

G1
D1
10
3
5
";

#[test]
fn test_loaded_scenario_runs_to_completion() {
    let cfg = parse_scenario(INPUT, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(cfg.mode, SchedulingMode::NonPreemptive);
    assert_eq!(cfg.consumers[2].id, "S3");

    let (_, clock) = VirtualClock::shared();
    let summary = build_driver(&cfg, clock, Vec::new()).unwrap().run().unwrap();
    assert_eq!(summary.decisions.len(), 4);
    assert!(summary
        .statuses
        .iter()
        .all(|(_, status)| *status == ConsumerStatus::Done));
}

#[test]
fn test_windows_line_endings_are_accepted() {
    let crlf = INPUT.replace('\n', "\r\n");
    let cfg = parse_scenario(&crlf, &mut StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(cfg.consumers[0].pools, vec!["D1".to_string(), "D2".to_string()]);
}

#[test]
fn test_truncated_input_reports_line() {
    let truncated: String = INPUT.lines().take(14).collect::<Vec<_>>().join("\n");
    let err = parse_scenario(&truncated, &mut StdRng::seed_from_u64(1)).unwrap_err();
    assert!(matches!(err, SchedulerError::Scenario { line: 15, .. }));
}
