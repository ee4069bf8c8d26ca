//! Reporting sinks: where student events and the final summary go
//!
//! Sinks are shared by every student of a run and may be called from many
//! threads at once; each call writes a whole line or nothing.

use crate::outcome::RunSummary;
use colored::Colorize;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Neutral,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Arrived,
    StartedWashing { machine: usize, until: usize },
    FinishedWashing { machine: usize },
    LeftUnwashed,
}

impl EventKind {
    pub fn category(&self) -> Category {
        match self {
            EventKind::Arrived => Category::Neutral,
            EventKind::StartedWashing { .. } | EventKind::FinishedWashing { .. } => {
                Category::Success
            }
            EventKind::LeftUnwashed => Category::Failure,
        }
    }
}

/// A student's state transition at simulated time `at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StudentEvent {
    pub at: usize,
    pub student: usize,
    pub kind: EventKind,
}

impl StudentEvent {
    pub fn new(at: usize, student: usize, kind: EventKind) -> Self {
        StudentEvent { at, student, kind }
    }
}

impl fmt::Display for StudentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.kind {
            EventKind::Arrived => "arrives",
            EventKind::StartedWashing { .. } => "starts washing",
            EventKind::FinishedWashing { .. } => "leaves after washing",
            EventKind::LeftUnwashed => "leaves without washing",
        };
        write!(f, "Student {} {}", self.student, action)
    }
}

pub trait ReportSink: Send + Sync {
    fn event(&self, event: &StudentEvent);

    fn summary(&self, _summary: &RunSummary) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    /// Abandoned count, then `Yes` / `No`
    #[default]
    Lines,
    Json,
}

/// Writes colored event lines and the summary to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    show_time: bool,
    colors: bool,
    format: SummaryFormat,
}

impl ConsoleSink {
    pub fn new(show_time: bool, colors: bool, format: SummaryFormat) -> Self {
        ConsoleSink {
            show_time,
            colors,
            format,
        }
    }

    pub fn render_event(&self, event: &StudentEvent) -> String {
        let line = if self.show_time {
            format!("[{}] {}", event.at, event)
        } else {
            event.to_string()
        };
        if !self.colors {
            return line;
        }
        match (event.kind.category(), event.kind) {
            (Category::Neutral, _) => line.normal().to_string(),
            (Category::Failure, _) => line.red().to_string(),
            // leaving is still a success, shown apart from starting
            (Category::Success, EventKind::FinishedWashing { .. }) => line.yellow().to_string(),
            (Category::Success, _) => line.green().to_string(),
        }
    }

    pub fn render_summary(&self, summary: &RunSummary) -> Result<String, serde_json::Error> {
        match self.format {
            SummaryFormat::Lines => Ok(format!("{}\n{}", summary.abandoned, summary.verdict())),
            SummaryFormat::Json => serde_json::to_string_pretty(summary),
        }
    }

    fn write_line(line: &str) {
        // stdout's lock keeps concurrent lines whole
        let mut out = io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line) {
            log::warn!("failed to write report line: {}", e);
        }
    }
}

impl ReportSink for ConsoleSink {
    fn event(&self, event: &StudentEvent) {
        Self::write_line(&self.render_event(event));
    }

    fn summary(&self, summary: &RunSummary) {
        match self.render_summary(summary) {
            Ok(text) => Self::write_line(&text),
            Err(e) => log::error!("failed to render summary: {}", e),
        }
    }
}

/// Discards everything; used for batch sweeps
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn event(&self, _event: &StudentEvent) {}
}

/// A machine held by one student over `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub student: usize,
    pub machine: usize,
    pub start: usize,
    pub end: usize,
}

/// Keeps every event in memory, in the order reported
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StudentEvent>>,
    summary: Mutex<Option<RunSummary>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StudentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_of(&self, student: usize) -> Vec<StudentEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.student == student)
            .collect()
    }

    pub fn last_summary(&self) -> Option<RunSummary> {
        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Machine occupation intervals, one per student that started washing
    pub fn occupancy(&self) -> Vec<Occupancy> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.kind {
                EventKind::StartedWashing { machine, until } => Some(Occupancy {
                    student: e.student,
                    machine,
                    start: e.at,
                    end: until,
                }),
                _ => None,
            })
            .collect()
    }
}

impl ReportSink for RecordingSink {
    fn event(&self, event: &StudentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }

    fn summary(&self, summary: &RunSummary) {
        *self.summary.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
    }
}
