//! Threaded engine: one OS thread per student
//!
//! Every thread runs its student's state machine against the shared pool and
//! waits on the shared [`Clock`] between steps. All threads are joined
//! before the caller reads the outcome counters.

use crate::client::{ClientTimer, NextStep, Student, StudentRecord};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::outcome::Outcomes;
use crate::pool::SharedPool;
use crate::report::{EventKind, ReportSink, StudentEvent};
use std::thread;

/// Everything a student thread shares with the others
#[derive(Clone, Copy)]
pub struct Shared<'a> {
    pub pool: &'a SharedPool,
    pub outcomes: &'a Outcomes,
    pub sink: &'a dyn ReportSink,
    pub clock: &'a dyn Clock,
}

/// Run every student on its own thread and wait for all of them
///
/// Records come back in the order of `students`.
pub fn run_students(students: &[Student], shared: Shared<'_>) -> Result<Vec<StudentRecord>> {
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(students.len());
        for &student in students {
            let handle = thread::Builder::new()
                .name(format!("student-{}", student.index))
                .spawn_scoped(scope, move || run_student(student, shared))
                .map_err(|source| Error::Spawn {
                    student: student.index,
                    source,
                })?;
            handles.push((student.index, handle));
        }

        handles
            .into_iter()
            .map(|(index, handle)| handle.join().map_err(|_| Error::StudentPanicked(index)))
            .collect()
    })
}

/// One student's whole visit, from arrival to departure
pub fn run_student(student: Student, shared: Shared<'_>) -> StudentRecord {
    let Shared {
        pool,
        outcomes,
        sink,
        clock,
    } = shared;
    let mut timer = ClientTimer::new(student);
    let report = |at: usize, kind: EventKind| {
        sink.event(&StudentEvent::new(at, student.index, kind));
    };

    clock.wait_until(student.arrival);
    if let Some(at) = timer.arrive() {
        report(at, EventKind::Arrived);
    }

    while let Some(now) = timer.begin_attempt() {
        if let Some(grant) = pool.try_acquire(now, student.wash_time) {
            log::debug!(
                "[{}] student {} granted machine {} until {}",
                now,
                student.index,
                grant.machine,
                grant.until
            );
            timer.granted(grant);
            report(
                now,
                EventKind::StartedWashing {
                    machine: grant.machine,
                    until: grant.until,
                },
            );
            clock.wait_until(grant.until);
            if let Some(at) = timer.finish() {
                outcomes.record_served();
                report(
                    at,
                    EventKind::FinishedWashing {
                        machine: grant.machine,
                    },
                );
            }
            break;
        }

        log::debug!("[{}] student {} found no free machine", now, student.index);
        match timer.denied() {
            Some(NextStep::Retry(at)) => clock.wait_until(at),
            Some(NextStep::GiveUp(at)) => {
                clock.wait_until(at);
                if timer.abandon().is_some() {
                    outcomes.record_abandoned();
                    report(at, EventKind::LeftUnwashed);
                }
                break;
            }
            None => break,
        }
    }

    timer.record()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Outcome;
    use crate::clock::WallClock;
    use crate::pool::ResourcePool;
    use crate::report::RecordingSink;
    use std::time::Duration;

    #[test]
    fn lone_student_is_served() {
        let pool = SharedPool::new(ResourcePool::new(1));
        let outcomes = Outcomes::new();
        let sink = RecordingSink::new();
        let clock = WallClock::new(Duration::from_millis(2));
        let shared = Shared {
            pool: &pool,
            outcomes: &outcomes,
            sink: &sink,
            clock: &clock,
        };

        let record = run_student(Student::new(1, 1, 2, 0), shared);

        assert_eq!(record.outcome, Outcome::Served);
        assert_eq!(record.started_at, Some(1));
        assert_eq!(outcomes.served(), 1);
        assert_eq!(sink.events().len(), 3);
    }

    #[test]
    fn blocked_student_gives_up_after_patience() {
        let pool = SharedPool::new(ResourcePool::from_busy_until(vec![100]));
        let outcomes = Outcomes::new();
        let sink = RecordingSink::new();
        let clock = WallClock::new(Duration::from_millis(2));
        let shared = Shared {
            pool: &pool,
            outcomes: &outcomes,
            sink: &sink,
            clock: &clock,
        };

        let record = run_student(Student::new(4, 0, 1, 3), shared);

        assert_eq!(record.outcome, Outcome::Abandoned);
        assert_eq!(record.attempts, 4);
        assert_eq!(outcomes.abandoned(), 1);
        assert_eq!(
            sink.events().last(),
            Some(&StudentEvent::new(4, 4, EventKind::LeftUnwashed))
        );
    }
}
