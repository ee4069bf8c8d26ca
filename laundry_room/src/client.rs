//! Students and the per-student patience state machine
//!
//! A [`ClientTimer`] only tracks logical time. The engine driving it decides
//! how a time unit passes: a scheduled event in the discrete engine, a real
//! sleep in the threaded one. Both see the same transitions.

use crate::pool::Grant;
use serde::Serialize;

/// One student as read from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Student {
    /// 1-based position in the input
    pub index: usize,
    /// Time units from the start of the simulation
    pub arrival: usize,
    /// Time units a machine stays occupied
    pub wash_time: usize,
    /// Time units the student keeps retrying after arrival
    pub patience: usize,
}

impl Student {
    pub fn new(index: usize, arrival: usize, wash_time: usize, patience: usize) -> Self {
        Student {
            index,
            arrival,
            wash_time,
            patience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Unarrived,
    Waiting,
    Washing { machine: usize, until: usize },
    Served,
    Abandoned,
}

/// What a student does after a machine request is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Ask again at this time
    Retry(usize),
    /// Patience is used up; the student leaves at this time
    GiveUp(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Served,
    Abandoned,
}

/// Per-student summary available after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub student: usize,
    pub outcome: Outcome,
    pub attempts: usize,
    pub waited: usize,
    pub machine: Option<usize>,
    pub started_at: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ClientTimer {
    student: Student,
    phase: Phase,
    waited: usize,
    attempts: usize,
    grant: Option<(usize, usize)>, // machine, start time
}

impl ClientTimer {
    pub fn new(student: Student) -> Self {
        ClientTimer {
            student,
            phase: Phase::Unarrived,
            waited: 0,
            attempts: 0,
            grant: None,
        }
    }

    pub fn student(&self) -> &Student {
        &self.student
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn waited(&self) -> usize {
        self.waited
    }

    /// Logical time of the student's current attempt
    pub fn now(&self) -> usize {
        self.student.arrival + self.waited
    }

    pub fn served(&self) -> bool {
        self.phase == Phase::Served
    }

    pub fn departed(&self) -> bool {
        matches!(self.phase, Phase::Served | Phase::Abandoned)
    }

    /// `Unarrived -> Waiting`. Returns the arrival time.
    pub fn arrive(&mut self) -> Option<usize> {
        if self.phase != Phase::Unarrived {
            return self.reject("arrive");
        }
        self.phase = Phase::Waiting;
        Some(self.student.arrival)
    }

    /// Count a machine request made now. Returns the request time.
    pub fn begin_attempt(&mut self) -> Option<usize> {
        if self.phase != Phase::Waiting {
            return self.reject("request a machine");
        }
        self.attempts += 1;
        Some(self.now())
    }

    /// `Waiting -> Washing`. Returns the time washing starts.
    pub fn granted(&mut self, grant: Grant) -> Option<usize> {
        if self.phase != Phase::Waiting {
            return self.reject("start washing");
        }
        let now = self.now();
        self.phase = Phase::Washing {
            machine: grant.machine,
            until: grant.until,
        };
        self.grant = Some((grant.machine, now));
        Some(now)
    }

    /// One more time unit of waiting after a refusal
    ///
    /// The first request happens at `waited == 0`, the last at
    /// `waited == patience`, so a student makes `patience + 1` requests and
    /// gives up one unit after the last one.
    pub fn denied(&mut self) -> Option<NextStep> {
        if self.phase != Phase::Waiting {
            return self.reject("wait");
        }
        self.waited += 1;
        if self.waited > self.student.patience {
            Some(NextStep::GiveUp(self.now()))
        } else {
            Some(NextStep::Retry(self.now()))
        }
    }

    /// `Washing -> Served`. Returns the time the machine is released.
    pub fn finish(&mut self) -> Option<usize> {
        match self.phase {
            Phase::Washing { until, .. } => {
                self.phase = Phase::Served;
                Some(until)
            }
            _ => self.reject("finish washing"),
        }
    }

    /// `Waiting -> Abandoned`, allowed only once patience is exhausted.
    /// Returns the departure time.
    pub fn abandon(&mut self) -> Option<usize> {
        if self.phase != Phase::Waiting || self.waited <= self.student.patience {
            return self.reject("abandon");
        }
        self.phase = Phase::Abandoned;
        Some(self.now())
    }

    pub fn record(&self) -> StudentRecord {
        let outcome = match self.phase {
            Phase::Served => Outcome::Served,
            Phase::Abandoned => Outcome::Abandoned,
            _ => Outcome::Pending,
        };
        StudentRecord {
            student: self.student.index,
            outcome,
            attempts: self.attempts,
            waited: self.waited,
            machine: self.grant.map(|(machine, _)| machine),
            started_at: self.grant.map(|(_, start)| start),
        }
    }

    fn reject<T>(&self, action: &str) -> Option<T> {
        log::warn!(
            "student {} cannot {} while {:?}",
            self.student.index,
            action,
            self.phase
        );
        None
    }
}
