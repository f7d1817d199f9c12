//! Line-oriented scenario file loader.
//!
//! Layout, one value per line:
//!
//! ```text
//! mode flag          1 = non-preemptive, anything else = preemptive
//! quantum ms
//! max burst ms       upper bound for generated bursts
//! max priority       upper bound for generated priorities
//! N                  professor count, then N blocks of:
//!   name, discipline, capacity
//! M                  student count, then M blocks of:
//!   name, group, disciplines (space separated), burst ms, priority, arrival ms
//! ```
//!
//! Blank professor and student fields are filled from the injected RNG.

use std::collections::HashSet;

use rand::Rng;
use tracing::debug;

use crate::config::{ConsumerConfig, ProfessorConfig, ScenarioConfig, SchedulingMode};
use crate::core::{RemainingEstimate, SchedulerError};

/// Disciplines drawn from when no student names one.
const FALLBACK_DISCIPLINES: [&str; 3] = ["D1", "D2", "D3"];

/// Largest generated professor capacity.
const MAX_GENERATED_CAPACITY: usize = 4;

/// Generated arrivals fall within this many maximum bursts.
const ARRIVAL_SPREAD: u64 = 5;

struct Lines<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().map(str::trim).collect(),
            pos: 0,
        }
    }

    /// Next line and its one-based number.
    fn next(&mut self, what: &str) -> Result<(usize, &'a str), SchedulerError> {
        let line = self.pos + 1;
        let text = self.lines.get(self.pos).copied().ok_or_else(|| SchedulerError::Scenario {
            line,
            reason: format!("unexpected end of input, expected {what}"),
        })?;
        self.pos += 1;
        Ok((line, text))
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, SchedulerError> {
        let (line, text) = self.next(what)?;
        parse(line, text, what)
    }

    /// A field that may be blank.
    fn optional<T: std::str::FromStr>(&mut self, what: &str) -> Result<Option<T>, SchedulerError> {
        let (line, text) = self.next(what)?;
        if text.is_empty() {
            return Ok(None);
        }
        parse(line, text, what).map(Some)
    }
}

fn parse<T: std::str::FromStr>(line: usize, text: &str, what: &str) -> Result<T, SchedulerError> {
    text.parse().map_err(|_| SchedulerError::Scenario {
        line,
        reason: format!("invalid {what} `{text}`"),
    })
}

struct RawProfessor {
    name: String,
    discipline: String,
    capacity: Option<usize>,
}

struct RawStudent {
    name: String,
    group: String,
    disciplines: Vec<String>,
    burst_ms: Option<u64>,
    priority: Option<i64>,
    arrival_ms: Option<u64>,
    /// Line of the student's name, for error reporting.
    line: usize,
}

/// Parse a scenario and fill blank fields.
///
/// # Errors
///
/// Returns [`SchedulerError::Scenario`] with the offending line for missing
/// lines and malformed numbers, or when a field must be generated but its
/// upper bound is below one.
pub fn parse_scenario<R: Rng + ?Sized>(input: &str, rng: &mut R) -> Result<ScenarioConfig, SchedulerError> {
    let mut lines = Lines::new(input);

    let mode = if lines.number::<i64>("mode flag")? == 1 {
        SchedulingMode::NonPreemptive
    } else {
        SchedulingMode::Preemptive
    };
    let quantum_ms = lines.number::<u64>("quantum")?;
    let max_burst_ms = lines.number::<u64>("max burst")?;
    let max_priority = lines.number::<i64>("max priority")?;

    let professor_count = lines.number::<usize>("professor count")?;
    let mut raw_professors = Vec::with_capacity(professor_count);
    for _ in 0..professor_count {
        let (_, name) = lines.next("professor name")?;
        let (_, discipline) = lines.next("professor discipline")?;
        let capacity = lines.optional("professor capacity")?;
        raw_professors.push(RawProfessor {
            name: name.to_string(),
            discipline: discipline.to_string(),
            capacity,
        });
    }

    let student_count = lines.number::<usize>("student count")?;
    let mut raw_students = Vec::with_capacity(student_count);
    for _ in 0..student_count {
        let (line, name) = lines.next("student name")?;
        let (_, group) = lines.next("student group")?;
        let (_, disciplines) = lines.next("student disciplines")?;
        raw_students.push(RawStudent {
            name: name.to_string(),
            group: group.to_string(),
            disciplines: disciplines.split_whitespace().map(str::to_string).collect(),
            burst_ms: lines.optional("burst")?,
            priority: lines.optional("priority")?,
            arrival_ms: lines.optional("arrival")?,
            line,
        });
    }

    let disciplines = used_disciplines(&raw_students);
    let professors = fill_professors(raw_professors, &disciplines, rng);
    let consumers = fill_students(raw_students, &disciplines, max_burst_ms, max_priority, rng)?;

    debug!(
        professors = professors.len(),
        consumers = consumers.len(),
        ?mode,
        "scenario loaded"
    );

    Ok(ScenarioConfig {
        quantum_ms,
        mode,
        remaining_estimate: RemainingEstimate::default(),
        poll_interval_ms: None,
        professors,
        consumers,
    })
}

/// Sorted, deduplicated disciplines named by students, or the fallback set.
fn used_disciplines(students: &[RawStudent]) -> Vec<String> {
    let mut used: Vec<String> = students
        .iter()
        .flat_map(|s| s.disciplines.iter().cloned())
        .collect();
    used.sort();
    used.dedup();
    if used.is_empty() {
        used = FALLBACK_DISCIPLINES.iter().map(|d| (*d).to_string()).collect();
    }
    used
}

/// First `<prefix><k>` not already taken; records the pick.
fn unique_name(prefix: &str, next: &mut usize, taken: &mut HashSet<String>) -> String {
    loop {
        let candidate = format!("{prefix}{next}");
        *next += 1;
        if taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, from: &'a [String]) -> &'a str {
    &from[rng.random_range(0..from.len())]
}

fn fill_professors<R: Rng + ?Sized>(
    raw: Vec<RawProfessor>,
    disciplines: &[String],
    rng: &mut R,
) -> Vec<ProfessorConfig> {
    let mut taken: HashSet<String> = raw.iter().map(|p| p.name.clone()).collect();
    let mut next = 1;
    raw.into_iter()
        .map(|p| ProfessorConfig {
            name: if p.name.is_empty() {
                unique_name("P", &mut next, &mut taken)
            } else {
                p.name
            },
            discipline: if p.discipline.is_empty() {
                pick(rng, disciplines).to_string()
            } else {
                p.discipline
            },
            capacity: p
                .capacity
                .unwrap_or_else(|| rng.random_range(1..=MAX_GENERATED_CAPACITY)),
        })
        .collect()
}

fn fill_students<R: Rng + ?Sized>(
    raw: Vec<RawStudent>,
    disciplines: &[String],
    max_burst_ms: u64,
    max_priority: i64,
    rng: &mut R,
) -> Result<Vec<ConsumerConfig>, SchedulerError> {
    let mut taken: HashSet<String> = raw.iter().map(|s| s.name.clone()).collect();
    let mut next = 1;
    let mut out = Vec::with_capacity(raw.len());

    for s in raw {
        let needs_burst_bound = s.burst_ms.is_none() || s.arrival_ms.is_none();
        if needs_burst_bound && max_burst_ms == 0 {
            return Err(SchedulerError::Scenario {
                line: s.line,
                reason: "max burst must be at least 1 to generate burst or arrival".into(),
            });
        }
        if s.priority.is_none() && max_priority < 1 {
            return Err(SchedulerError::Scenario {
                line: s.line,
                reason: "max priority must be at least 1 to generate priority".into(),
            });
        }

        let id = if s.name.is_empty() {
            unique_name("S", &mut next, &mut taken)
        } else {
            s.name
        };
        let group = if s.group.is_empty() { "G1".to_string() } else { s.group };
        let pools = if s.disciplines.is_empty() {
            vec![pick(rng, disciplines).to_string()]
        } else {
            s.disciplines
        };

        out.push(ConsumerConfig {
            id,
            group,
            pools,
            burst_ms: s.burst_ms.unwrap_or_else(|| rng.random_range(1..=max_burst_ms)),
            priority: s.priority.unwrap_or_else(|| rng.random_range(1..=max_priority)),
            arrival_ms: s
                .arrival_ms
                .unwrap_or_else(|| rng.random_range(1..=ARRIVAL_SPREAD.saturating_mul(max_burst_ms))),
        });
    }
    Ok(out)
}
