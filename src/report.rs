//! Report rendering.
//!
//! A report starts with the scenario as it was run (defaults filled in), then
//! the total elapsed time in seconds, then one line per snapshot: every slot
//! as a 6-wide column plus two spaces (occupant id or `-1`), followed by every
//! consumer status code in a 3-wide column.

use std::fmt::Write;
use std::time::Duration;

use crate::config::ScenarioConfig;
use crate::core::Snapshot;

/// Scenario header: professors then students, one field per line.
#[must_use]
pub fn header(cfg: &ScenarioConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", cfg.professors.len());
    for professor in &cfg.professors {
        let _ = writeln!(out, "{}\n{}\n{}", professor.name, professor.discipline, professor.capacity);
    }
    let _ = writeln!(out, "{}", cfg.consumers.len());
    for consumer in &cfg.consumers {
        let _ = writeln!(
            out,
            "{}\n{}\n{}\n{}\n{}\n{}",
            consumer.id,
            consumer.group,
            consumer.pools.join(" "),
            consumer.burst_ms,
            consumer.priority,
            consumer.arrival_ms
        );
    }
    out
}

/// One trace line for a snapshot.
#[must_use]
pub fn trace_line(snapshot: &Snapshot) -> String {
    let mut line = String::new();
    for slot in &snapshot.slots {
        let _ = write!(line, "{:6}  ", slot.occupant.as_deref().unwrap_or("-1"));
    }
    for (_, status) in &snapshot.statuses {
        let _ = write!(line, "{:3}", status.code());
    }
    line.trim().to_string()
}

/// Full report: header, elapsed seconds, trace lines.
#[must_use]
pub fn render(cfg: &ScenarioConfig, elapsed: Duration, snapshots: &[Snapshot]) -> String {
    let mut out = header(cfg);
    let _ = writeln!(out, "{}", elapsed.as_secs_f64());
    for snapshot in snapshots {
        let _ = writeln!(out, "{}", trace_line(snapshot));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConsumerConfig, ProfessorConfig, SchedulingMode};
    use crate::core::{ConsumerStatus, RemainingEstimate, SlotView};

    fn scenario() -> ScenarioConfig {
        ScenarioConfig {
            quantum_ms: 100,
            mode: SchedulingMode::Preemptive,
            remaining_estimate: RemainingEstimate::Continuous,
            poll_interval_ms: None,
            professors: vec![ProfessorConfig {
                name: "P1".into(),
                discipline: "D1".into(),
                capacity: 2,
            }],
            consumers: vec![ConsumerConfig {
                id: "S1".into(),
                group: "G1".into(),
                pools: vec!["D1".into(), "D2".into()],
                burst_ms: 300,
                priority: 2,
                arrival_ms: 0,
            }],
        }
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(header(&scenario()), "1\nP1\nD1\n2\n1\nS1\nG1\nD1 D2\n300\n2\n0\n");
    }

    #[test]
    fn test_trace_line_columns() {
        let snapshot = Snapshot {
            quantum_index: 3,
            elapsed: Duration::from_millis(250),
            forced: false,
            slots: vec![
                SlotView {
                    pool: "D1".into(),
                    label: "P1".into(),
                    occupant: Some("S12".into()),
                },
                SlotView {
                    pool: "D1".into(),
                    label: "P1".into(),
                    occupant: None,
                },
            ],
            statuses: vec![
                ("S12".into(), ConsumerStatus::Running),
                ("S2".into(), ConsumerStatus::NotArrived),
            ],
        };
        assert_eq!(trace_line(&snapshot), "S12     -1        1 -1");
    }

    #[test]
    fn test_render_places_elapsed_after_header() {
        let text = render(&scenario(), Duration::from_millis(1500), &[]);
        assert!(text.ends_with("0\n1.5\n"));
    }
}
