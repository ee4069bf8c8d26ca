//! Laundry room simulation
//!
//! Students arrive at a room with a fixed number of washing machines. Each
//! one keeps asking for the earliest-free machine until it gets one or runs
//! out of patience. The run reports every arrival, wash and departure, then
//! how many students left unwashed and whether that is at least a quarter of
//! them.
//!
//! Two engines drive the same per-student state machine
//! ([`client::ClientTimer`]) against the same pool ([`pool::SharedPool`]):
//! - the discrete engine (`des` event loop, logical clock, deterministic)
//! - the threaded engine (one thread per student, wall-clock time units)

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod outcome;
pub mod pool;
pub mod report;
pub mod room;
pub mod roster;
pub mod simulation;
pub mod sweep;
pub mod threaded;

pub use client::{ClientTimer, NextStep, Outcome, Phase, Student, StudentRecord};
pub use error::{Error, Result};
pub use input::Workload;
pub use outcome::{Outcomes, RunSummary};
pub use pool::{Grant, ResourcePool, SharedPool};
pub use report::{ConsoleSink, EventKind, NullSink, RecordingSink, ReportSink, StudentEvent};
pub use room::MachineRoom;
pub use roster::StudentRoster;
pub use simulation::{Engine, RunReport, Simulation};

/// Events of the discrete engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Student reaches the laundry room
    Arrival(usize), // student index
    /// Student asks for a machine for `duration` time units
    MachineRequested { student: usize, duration: usize },
    MachineGranted {
        student: usize,
        machine: usize,
        until: usize,
    },
    /// No machine is free right now
    MachineBusy { student: usize },
    WashFinished { student: usize, machine: usize },
    /// Patience used up, student leaves unwashed
    PatienceExpired(usize), // student index
}

/// Observable state of the students after a run
#[derive(Debug, Clone, PartialEq)]
pub struct RosterStats {
    pub summary: RunSummary,
    pub records: Vec<StudentRecord>,
}

/// Observable state of the machines after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStats {
    pub busy_until: Vec<usize>,
    pub grants: usize,
    pub denials: usize,
}

impl RoomStats {
    pub fn machines(&self) -> usize {
        self.busy_until.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stats {
    Roster(RosterStats),
    Room(RoomStats),
}

impl Stats {
    /// First roster entry among the stats of a run
    pub fn find_roster(stats: &[Stats]) -> Option<&RosterStats> {
        stats.iter().find_map(|s| match s {
            Stats::Roster(roster) => Some(roster),
            _ => None,
        })
    }

    /// First room entry among the stats of a run
    pub fn find_room(stats: &[Stats]) -> Option<&RoomStats> {
        stats.iter().find_map(|s| match s {
            Stats::Room(room) => Some(room),
            _ => None,
        })
    }
}
