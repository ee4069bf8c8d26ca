//! Monte Carlo sweep over randomly generated workloads
//!
//! Each scenario draws its own workload from `seed + scenario`, runs it on
//! the discrete engine and contributes one CSV row. Scenarios run on the
//! rayon pool of [`des::parallel::ParallelRunner`], so rows are identical
//! whatever the thread count.

use crate::client::Student;
use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::input::Workload;
use crate::report::NullSink;
use crate::simulation::Simulation;
use crate::Stats;
use des::parallel::{ParallelRunner, log_progress};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Geometric, Normal};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// One scenario's result, one CSV row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub scenario: usize,
    pub seed: u64,
    pub students: usize,
    pub machines: usize,
    pub served: usize,
    pub abandoned: usize,
    pub percent_abandoned: f64,
    pub threshold_exceeded: bool,
}

/// Draw a workload from `config`'s distributions
///
/// Inter-arrival gaps are geometric, wash times and patience normal, rounded
/// and clamped at zero.
pub fn generate_workload(config: &SweepConfig, seed: u64) -> Result<Workload> {
    let mut rng = StdRng::seed_from_u64(seed);
    let gaps = Geometric::new(config.arrival_probability)
        .map_err(|e| Error::Distribution(format!("arrival gaps: {}", e)))?;
    let wash = Normal::new(config.wash_mean, config.wash_std)
        .map_err(|e| Error::Distribution(format!("wash time: {}", e)))?;
    let patience = Normal::new(config.patience_mean, config.patience_std)
        .map_err(|e| Error::Distribution(format!("patience: {}", e)))?;

    let mut arrival = 0usize;
    let mut students = Vec::with_capacity(config.students);
    for index in 1..=config.students {
        if index > 1 {
            let gap = usize::try_from(gaps.sample(&mut rng)).unwrap_or(usize::MAX);
            arrival = arrival.saturating_add(gap);
        }
        students.push(Student::new(
            index,
            arrival,
            non_negative(wash.sample(&mut rng)),
            non_negative(patience.sample(&mut rng)),
        ));
    }
    Workload::new(config.machines, students)
}

fn non_negative(sample: f64) -> usize {
    sample.round().max(0.0) as usize
}

/// Run every scenario of `config` and collect one row each, in scenario order
pub fn run_sweep(config: &SweepConfig) -> Result<Vec<SweepRow>> {
    config.validate()?;
    log::info!(
        "sweep: {} scenarios of {} students on {} machines",
        config.scenarios,
        config.students,
        config.machines
    );

    let seeds: Vec<u64> = (0..config.scenarios)
        .map(|scenario| config.seed.wrapping_add(scenario as u64))
        .collect();
    let workloads = seeds
        .iter()
        .map(|&seed| generate_workload(config, seed))
        .collect::<Result<Vec<_>>>()?;

    let mut runner = ParallelRunner::new(config.scenarios, |scenario| {
        Simulation::new(workloads[scenario].clone(), Arc::new(NullSink)).into_event_loop()
    })
    .progress(log_progress((config.scenarios / 10).max(1)));
    if let Some(threads) = config.threads {
        runner = runner.num_threads(threads);
    }
    let results = runner.run(usize::MAX)?;

    results
        .into_iter()
        .enumerate()
        .map(|(scenario, result)| {
            let stats = result.map_err(|message| Error::ScenarioFailed { scenario, message })?;
            let roster = Stats::find_roster(&stats).ok_or(Error::MissingStats(scenario))?;
            let summary = &roster.summary;
            Ok(SweepRow {
                scenario,
                seed: seeds[scenario],
                students: summary.total,
                machines: config.machines,
                served: summary.served,
                abandoned: summary.abandoned,
                percent_abandoned: summary.percent_abandoned,
                threshold_exceeded: summary.threshold_exceeded,
            })
        })
        .collect()
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write>(rows: &[SweepRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}
