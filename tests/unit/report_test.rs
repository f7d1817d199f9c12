//! Tests for report rendering

use sjf_exam_sim::builders::build_driver;
use sjf_exam_sim::config::ScenarioConfig;
use sjf_exam_sim::infra::{MemorySink, WriterSink};
use sjf_exam_sim::report;
use sjf_exam_sim::util::VirtualClock;

#[test]
fn test_report_lines_match_streamed_lines() {
    let cfg = ScenarioConfig::from_json_str(
        r#"{
            "quantum_ms": 10,
            "mode": "non_preemptive",
            "poll_interval_ms": 2,
            "professors": [{"name": "P1", "discipline": "D1", "capacity": 1}],
            "consumers": [
                {"id": "S1", "pools": ["D1"], "burst_ms": 20, "priority": 1},
                {"id": "S2", "pools": ["D1"], "burst_ms": 10, "priority": 1, "arrival_ms": 4}
            ]
        }"#,
    )
    .unwrap();

    let memory = MemorySink::unbounded();
    let streamed = WriterSink::new(Vec::new());
    let (_, clock) = VirtualClock::shared();
    let summary = build_driver(&cfg, clock, vec![Box::new(memory.clone()), Box::new(streamed)])
        .unwrap()
        .run()
        .unwrap();

    let text = report::render(&cfg, summary.elapsed, &memory.snapshots());
    let lines: Vec<_> = text.lines().collect();
    let header_len = 1 + 3 + 1 + 2 * 6;
    assert_eq!(lines[0], "1");
    assert_eq!(lines[header_len], summary.elapsed.as_secs_f64().to_string());
    assert_eq!(lines.len(), header_len + 1 + summary.snapshots);
    // Final snapshot: empty slot, both students done.
    assert_eq!(*lines.last().unwrap(), "-1        2  2");
}
