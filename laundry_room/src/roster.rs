//! Student roster agent
//!
//! Holds the state machine of every student in one agent, so each broadcast
//! event costs one lookup instead of one call per student.

use crate::client::{ClientTimer, NextStep};
use crate::input::Workload;
use crate::outcome::{Outcomes, RunSummary};
use crate::pool::Grant;
use crate::report::{EventKind, ReportSink, StudentEvent};
use crate::{Event, RosterStats, Stats};
use des::{Agent, Response};
use std::sync::Arc;

pub struct StudentRoster {
    timers: Vec<ClientTimer>, // student index - 1
    outcomes: Outcomes,
    sink: Arc<dyn ReportSink>,
}

fn slot(timers: &mut [ClientTimer], student: usize) -> Option<&mut ClientTimer> {
    let timer = student.checked_sub(1).and_then(|i| timers.get_mut(i));
    if timer.is_none() {
        log::warn!("event for unknown student {}", student);
    }
    timer
}

impl StudentRoster {
    pub fn new(workload: &Workload, sink: Arc<dyn ReportSink>) -> Self {
        StudentRoster {
            timers: workload
                .students()
                .iter()
                .copied()
                .map(ClientTimer::new)
                .collect(),
            outcomes: Outcomes::new(),
            sink,
        }
    }

    /// Arrival events for every student, earliest first
    pub fn arrivals(workload: &Workload) -> Vec<(usize, Event)> {
        workload
            .by_arrival()
            .into_iter()
            .map(|s| (s.arrival, Event::Arrival(s.index)))
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        self.outcomes.summary(self.timers.len())
    }

    pub fn timer(&self, student: usize) -> Option<&ClientTimer> {
        student.checked_sub(1).and_then(|i| self.timers.get(i))
    }

    fn report(&self, at: usize, student: usize, kind: EventKind) {
        self.sink.event(&StudentEvent::new(at, student, kind));
    }

    fn arrive(&mut self, student: usize) -> Response<Event, Stats> {
        let Some(timer) = slot(&mut self.timers, student) else {
            return Response::new();
        };
        let Some(arrived_at) = timer.arrive() else {
            return Response::new();
        };
        let duration = timer.student().wash_time;
        let request = timer.begin_attempt();
        self.report(arrived_at, student, EventKind::Arrived);
        match request {
            Some(at) => Response::event(at, Event::MachineRequested { student, duration }),
            None => Response::new(),
        }
    }

    fn start_washing(&mut self, student: usize, grant: Grant) -> Response<Event, Stats> {
        let Some(timer) = slot(&mut self.timers, student) else {
            return Response::new();
        };
        let Some(started_at) = timer.granted(grant) else {
            return Response::new();
        };
        self.report(
            started_at,
            student,
            EventKind::StartedWashing {
                machine: grant.machine,
                until: grant.until,
            },
        );
        Response::event(
            grant.until,
            Event::WashFinished {
                student,
                machine: grant.machine,
            },
        )
    }

    fn refused(&mut self, student: usize) -> Response<Event, Stats> {
        let Some(timer) = slot(&mut self.timers, student) else {
            return Response::new();
        };
        let duration = timer.student().wash_time;
        match timer.denied() {
            Some(NextStep::Retry(at)) => {
                timer.begin_attempt();
                Response::event(at, Event::MachineRequested { student, duration })
            }
            Some(NextStep::GiveUp(at)) => Response::event(at, Event::PatienceExpired(student)),
            None => Response::new(),
        }
    }

    fn finish_washing(&mut self, current_t: usize, student: usize, machine: usize) {
        let Some(timer) = slot(&mut self.timers, student) else {
            return;
        };
        if timer.finish().is_some() {
            self.outcomes.record_served();
            self.report(current_t, student, EventKind::FinishedWashing { machine });
        }
    }

    fn give_up(&mut self, current_t: usize, student: usize) {
        let Some(timer) = slot(&mut self.timers, student) else {
            return;
        };
        if timer.abandon().is_some() {
            self.outcomes.record_abandoned();
            self.report(current_t, student, EventKind::LeftUnwashed);
        }
    }
}

impl Agent<Event, Stats> for StudentRoster {
    fn act(&mut self, current_t: usize, data: &Event) -> Response<Event, Stats> {
        match data {
            Event::Arrival(student) => self.arrive(*student),
            Event::MachineGranted {
                student,
                machine,
                until,
            } => self.start_washing(
                *student,
                Grant {
                    machine: *machine,
                    until: *until,
                },
            ),
            Event::MachineBusy { student } => self.refused(*student),
            Event::WashFinished { student, machine } => {
                self.finish_washing(current_t, *student, *machine);
                Response::new()
            }
            Event::PatienceExpired(student) => {
                self.give_up(current_t, *student);
                Response::new()
            }
            Event::MachineRequested { .. } => Response::new(),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Roster(RosterStats {
            summary: self.summary(),
            records: self.timers.iter().map(ClientTimer::record).collect(),
        })
    }
}
