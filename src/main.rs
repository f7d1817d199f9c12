//! `sjf-sim`: run an SJF exam scenario and write its report.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use sjf_exam_sim::builders::build_driver;
use sjf_exam_sim::config::{ScenarioConfig, SchedulingMode};
use sjf_exam_sim::core::{AppResult, TraceSink};
use sjf_exam_sim::infra::{parse_scenario, ChannelSink, MemorySink};
use sjf_exam_sim::report;
use sjf_exam_sim::util::{init_tracing, SystemClock};

#[derive(Parser)]
#[command(name = "sjf-sim")]
#[command(about = "Shortest-Job-First exam scheduling simulator", long_about = None)]
struct Cli {
    /// Scenario file: `.json`, or the line-oriented format
    input: PathBuf,
    /// Override the mode given in the scenario
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Directory the report is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Print trace lines to stdout while the run proceeds
    #[arg(long)]
    follow: bool,
    /// Seed for generated scenario fields
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Preemptive,
    NonPreemptive,
}

impl From<ModeArg> for SchedulingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Preemptive => Self::Preemptive,
            ModeArg::NonPreemptive => Self::NonPreemptive,
        }
    }
}

fn load(path: &Path, seed: Option<u64>) -> AppResult<ScenarioConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        return ScenarioConfig::from_json_str(&text).map_err(anyhow::Error::msg);
    }
    let cfg = match seed {
        Some(seed) => parse_scenario(&text, &mut StdRng::seed_from_u64(seed))?,
        None => parse_scenario(&text, &mut rand::rng())?,
    };
    Ok(cfg)
}

fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut cfg = load(&cli.input, cli.seed)?;
    if let Some(mode) = cli.mode {
        cfg.mode = mode.into();
    }

    let memory = MemorySink::unbounded();
    let mut sinks: Vec<Box<dyn TraceSink>> = vec![Box::new(memory.clone())];
    let follower = if cli.follow {
        let (sink, rx) = ChannelSink::unbounded();
        sinks.push(Box::new(sink));
        let handle = thread::Builder::new()
            .name("trace-follow".into())
            .spawn(move || {
                for snapshot in rx {
                    println!("{}", report::trace_line(&snapshot));
                }
            })
            .context("spawning trace follower")?;
        Some(handle)
    } else {
        None
    };

    let summary = build_driver(&cfg, SystemClock::shared(), sinks)?.run()?;
    if let Some(handle) = follower {
        if handle.join().is_err() {
            warn!("trace follower panicked");
        }
    }

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;
    let path = cli.output_dir.join(cfg.mode.output_file_name());
    fs::write(&path, report::render(&cfg, summary.elapsed, &memory.snapshots()))
        .with_context(|| format!("writing {}", path.display()))?;

    info!(
        report = %path.display(),
        elapsed_ms = summary.elapsed.as_millis(),
        admissions = summary.decisions.len(),
        "report written"
    );
    Ok(())
}
