//! Laundry room simulator
//!
//! Usage:
//!   laundry_room run [INPUT]                 # workload from file or stdin
//!   laundry_room run --engine threaded --time-unit-ms 100 input.txt
//!   laundry_room sweep --config sweep.toml --output results.csv

use clap::{Parser, Subcommand, ValueEnum};
use laundry_room::config::SweepConfig;
use laundry_room::report::SummaryFormat;
use laundry_room::sweep::{run_sweep, write_csv};
use laundry_room::{ConsoleSink, Engine, Result, Simulation, Workload};
use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(version, about = "Washing machine contention simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate one workload and report every student
    Run {
        /// Workload file; stdin when absent
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = EngineKind::Discrete)]
        engine: EngineKind,
        /// Real milliseconds per time unit (threaded engine)
        #[arg(long, default_value_t = 1000)]
        time_unit_ms: u64,
        /// Prefix each line with its logical time
        #[arg(long)]
        show_time: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run many generated workloads and write one CSV row per scenario
    Sweep {
        /// TOML sweep configuration; defaults when absent
        #[arg(long)]
        config: Option<PathBuf>,
        /// CSV destination; stdout when absent
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        scenarios: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        threads: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    Discrete,
    Threaded,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            input,
            engine,
            time_unit_ms,
            show_time,
            json,
        } => run(input, engine, time_unit_ms, show_time, json),
        Command::Sweep {
            config,
            output,
            scenarios,
            seed,
            threads,
        } => sweep(config, output, scenarios, seed, threads),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    input: Option<PathBuf>,
    engine: EngineKind,
    time_unit_ms: u64,
    show_time: bool,
    json: bool,
) -> Result<()> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => io::read_to_string(io::stdin())?,
    };
    let workload: Workload = text.parse()?;

    let format = if json {
        SummaryFormat::Json
    } else {
        SummaryFormat::Lines
    };
    let sink = Arc::new(ConsoleSink::new(
        show_time,
        io::stdout().is_terminal(),
        format,
    ));
    let engine = match engine {
        EngineKind::Discrete => Engine::Discrete,
        EngineKind::Threaded => Engine::Threaded {
            unit: Duration::from_millis(time_unit_ms),
        },
    };

    let start = Instant::now();
    let report = Simulation::new(workload, sink).run(engine)?;
    log::info!(
        "{} of {} students left unwashed ({:.1}%) in {:?}",
        report.summary.abandoned,
        report.summary.total,
        report.summary.percent_abandoned,
        start.elapsed()
    );
    Ok(())
}

fn sweep(
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    scenarios: Option<usize>,
    seed: Option<u64>,
    threads: Option<usize>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => SweepConfig::load(path)?,
        None => SweepConfig::default(),
    };
    if let Some(scenarios) = scenarios {
        config.scenarios = scenarios;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if threads.is_some() {
        config.threads = threads;
    }

    let start = Instant::now();
    let rows = run_sweep(&config)?;
    let flagged = rows.iter().filter(|r| r.threshold_exceeded).count();
    log::info!(
        "{} scenarios in {:?}, {} at or above the abandonment threshold",
        rows.len(),
        start.elapsed(),
        flagged
    );

    match output {
        Some(path) => write_csv(&rows, BufWriter::new(File::create(path)?)),
        None => write_csv(&rows, io::stdout().lock()),
    }
}
