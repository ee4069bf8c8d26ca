// Threaded engine runs with a few milliseconds per time unit
// Interleaving between threads is not fixed, so only counts and per-student
// laws are checked unless the workload has no contention

use laundry_room::{
    Engine, EventKind, Outcome, RecordingSink, RunReport, Simulation, StudentEvent, Workload,
};
use std::sync::Arc;
use std::time::Duration;

const UNIT: Duration = Duration::from_millis(5);

fn run(
    engine: Engine,
    machines: usize,
    students: &[(usize, usize, usize)],
) -> (RunReport, Arc<RecordingSink>) {
    let workload = Workload::from_triples(machines, students).unwrap();
    let sink = Arc::new(RecordingSink::new());
    let report = Simulation::new(workload, sink.clone()).run(engine).unwrap();
    (report, sink)
}

fn threaded(machines: usize, students: &[(usize, usize, usize)]) -> (RunReport, Arc<RecordingSink>) {
    run(Engine::Threaded { unit: UNIT }, machines, students)
}

#[test]
fn given_single_student_when_threaded_then_served() {
    let (report, sink) = threaded(1, &[(0, 2, 0)]);

    assert_eq!(report.summary.abandoned, 0);
    assert_eq!(report.summary.verdict(), "No");
    assert_eq!(sink.events().len(), 3);
    assert_eq!(sink.last_summary(), Some(report.summary.clone()));
}

#[test]
fn given_two_impatient_students_when_threaded_then_one_abandons() {
    let (report, sink) = threaded(1, &[(0, 3, 0), (0, 3, 0)]);

    // either thread may win the machine
    assert_eq!(report.summary.served, 1);
    assert_eq!(report.summary.abandoned, 1);
    assert_eq!(report.summary.verdict(), "Yes");
    let loser = report
        .students
        .iter()
        .find(|r| r.outcome == Outcome::Abandoned)
        .unwrap();
    assert_eq!(loser.attempts, 1);
    assert_eq!(
        sink.events_of(loser.student).last(),
        Some(&StudentEvent::new(1, loser.student, EventKind::LeftUnwashed))
    );
}

#[test]
fn given_machine_busy_past_patience_when_threaded_then_abandons_after_all_attempts() {
    let (report, _sink) = threaded(1, &[(0, 8, 0), (1, 1, 5)]);

    assert_eq!(report.students[0].outcome, Outcome::Served);
    assert_eq!(report.students[1].outcome, Outcome::Abandoned);
    assert_eq!(report.students[1].attempts, 6);
}

#[test]
fn threaded_runs_conserve_students_under_contention() {
    let students: Vec<(usize, usize, usize)> =
        (0..30).map(|i| (i % 5, 1 + i % 3, i % 4)).collect();

    let (report, sink) = threaded(2, &students);

    assert!(report.summary.is_conserved());
    assert_eq!(report.summary.total, 30);
    let departures = sink
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                EventKind::FinishedWashing { .. } | EventKind::LeftUnwashed
            )
        })
        .count();
    assert_eq!(departures, 30);
    for (record, &(_, _, patience)) in report.students.iter().zip(&students) {
        assert!(record.attempts <= patience + 1);
    }

    // no more machines busy than exist, never two students on one machine
    let occupancy = sink.occupancy();
    for (i, a) in occupancy.iter().enumerate() {
        let busy = occupancy
            .iter()
            .filter(|o| o.start <= a.start && a.start < o.end)
            .count();
        assert!(busy <= 2, "{} machines busy at t={}", busy, a.start);
        for b in &occupancy[i + 1..] {
            let overlap = a.start < b.end && b.start < a.end;
            assert!(a.machine != b.machine || !overlap, "{:?} overlaps {:?}", a, b);
        }
    }
}

#[test]
fn without_contention_both_engines_agree() {
    let students = [(0, 2, 0), (1, 3, 1), (3, 1, 0), (4, 2, 2)];

    let (discrete, _) = run(Engine::Discrete, 4, &students);
    let (wall, _) = threaded(4, &students);

    assert_eq!(discrete.summary, wall.summary);
    let starts = |report: &RunReport| -> Vec<Option<usize>> {
        report.students.iter().map(|r| r.started_at).collect()
    };
    assert_eq!(starts(&discrete), starts(&wall));
    assert_eq!(starts(&wall), vec![Some(0), Some(1), Some(3), Some(4)]);
}
