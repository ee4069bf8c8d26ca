//! Simulation context: owns the machine pool of one run and drives it with
//! either engine.

use crate::client::StudentRecord;
use crate::clock::{Clock, WallClock};
use crate::error::{Error, Result};
use crate::input::Workload;
use crate::outcome::{Outcomes, RunSummary};
use crate::pool::{ResourcePool, SharedPool};
use crate::report::ReportSink;
use crate::room::MachineRoom;
use crate::roster::StudentRoster;
use crate::threaded::{self, Shared};
use crate::{Event, Stats};
use des::EventLoop;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Logical clock and event queue; finishes as fast as it can compute
    Discrete,
    /// One thread per student, `unit` of real time per time unit
    Threaded { unit: Duration },
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    /// One record per student, in input order
    pub students: Vec<StudentRecord>,
    /// Machine state once everyone has left
    pub pool: ResourcePool,
}

pub struct Simulation {
    workload: Workload,
    pool: SharedPool,
    sink: Arc<dyn ReportSink>,
}

impl Simulation {
    pub fn new(workload: Workload, sink: Arc<dyn ReportSink>) -> Self {
        let pool = ResourcePool::new(workload.machines());
        Simulation {
            workload,
            pool: SharedPool::new(pool),
            sink,
        }
    }

    /// Start from machines that may already be occupied
    ///
    /// The pool must have exactly the workload's machine count.
    pub fn with_pool(
        workload: Workload,
        pool: ResourcePool,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self> {
        if pool.machines() != workload.machines() {
            return Err(Error::InvalidConfig(format!(
                "pool has {} machines, workload declares {}",
                pool.machines(),
                workload.machines()
            )));
        }
        Ok(Simulation {
            workload,
            pool: SharedPool::new(pool),
            sink,
        })
    }

    /// Event loop of the discrete engine, ready to run
    pub fn into_event_loop(self) -> EventLoop<Event, Stats> {
        let events = StudentRoster::arrivals(&self.workload);
        let agents: Vec<Box<dyn des::Agent<Event, Stats>>> = vec![
            Box::new(StudentRoster::new(&self.workload, self.sink)),
            Box::new(MachineRoom::new(self.pool)),
        ];
        EventLoop::new(events, agents)
    }

    pub fn run(self, engine: Engine) -> Result<RunReport> {
        match engine {
            Engine::Discrete => self.run_discrete(),
            Engine::Threaded { unit } => self.run_threaded(&WallClock::new(unit)),
        }
    }

    pub fn run_discrete(self) -> Result<RunReport> {
        log::info!(
            "discrete run: {} students, {} machines",
            self.workload.len(),
            self.workload.machines()
        );
        let sink = Arc::clone(&self.sink);
        let pool = self.pool.clone();

        let mut event_loop = self.into_event_loop();
        event_loop.run_to_completion();
        let stats = event_loop.stats();
        let roster = Stats::find_roster(&stats).ok_or(Error::MissingRunStats)?;
        if let Some(room) = Stats::find_room(&stats) {
            log::debug!(
                "{} machines: {} grants, {} refusals",
                room.machines(),
                room.grants,
                room.denials
            );
        }

        let report = RunReport {
            summary: roster.summary.clone(),
            students: roster.records.clone(),
            pool: pool.snapshot(),
        };
        log::info!(
            "discrete run finished at t={} after {} events",
            event_loop.current_t(),
            event_loop.processed_events()
        );
        sink.summary(&report.summary);
        Ok(report)
    }

    pub fn run_threaded(self, clock: &dyn Clock) -> Result<RunReport> {
        log::info!(
            "threaded run: {} students, {} machines",
            self.workload.len(),
            self.workload.machines()
        );
        let outcomes = Outcomes::new();
        let order = self.workload.by_arrival();
        let shared = Shared {
            pool: &self.pool,
            outcomes: &outcomes,
            sink: &*self.sink,
            clock,
        };

        let mut students = threaded::run_students(&order, shared)?;
        students.sort_by_key(|record| record.student);

        let report = RunReport {
            summary: outcomes.summary(self.workload.len()),
            students,
            pool: self.pool.snapshot(),
        };
        self.sink.summary(&report.summary);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingSink;

    #[test]
    fn discrete_run_reports_summary_to_sink() {
        let workload = Workload::from_triples(1, &[(0, 2, 0), (0, 2, 0)]).unwrap();
        let sink = Arc::new(RecordingSink::new());

        let report = Simulation::new(workload, sink.clone())
            .run(Engine::Discrete)
            .unwrap();

        assert_eq!(report.summary.abandoned, 1);
        assert_eq!(sink.last_summary(), Some(report.summary.clone()));
        assert_eq!(report.pool.busy_until(), &[2]);
    }

    #[test]
    fn records_come_back_in_input_order() {
        let workload = Workload::from_triples(2, &[(3, 1, 0), (0, 1, 0), (1, 1, 0)]).unwrap();

        let report = Simulation::new(workload, Arc::new(crate::report::NullSink))
            .run_discrete()
            .unwrap();

        let order: Vec<usize> = report.students.iter().map(|r| r.student).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn event_loop_starts_with_one_arrival_per_student() {
        let workload = Workload::from_triples(1, &[(0, 1, 0), (5, 1, 0)]).unwrap();

        let event_loop =
            Simulation::new(workload, Arc::new(crate::report::NullSink)).into_event_loop();

        assert_eq!(event_loop.pending_events(), 2);
        assert_eq!(event_loop.agent_count(), 2);
    }

    #[test]
    fn given_pool_with_wrong_machine_count_then_rejected() {
        let workload = Workload::from_triples(2, &[(0, 1, 0)]).unwrap();

        let result = Simulation::with_pool(
            workload,
            ResourcePool::from_busy_until(vec![0, 0, 0]),
            Arc::new(crate::report::NullSink),
        );

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn given_preoccupied_pool_then_students_wait_for_it() {
        let workload = Workload::from_triples(1, &[(0, 1, 2), (0, 1, 0)]).unwrap();

        let report = Simulation::with_pool(
            workload,
            ResourcePool::from_busy_until(vec![2]),
            Arc::new(crate::report::NullSink),
        )
        .unwrap()
        .run_discrete()
        .unwrap();

        assert_eq!(report.students[0].started_at, Some(2));
        assert_eq!(report.students[1].outcome, crate::client::Outcome::Abandoned);
        assert_eq!(report.pool.busy_until(), &[3]);
    }
}
