//! Tally of how students left and the end-of-run summary

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Share of abandoning students, in percent, at which the run is flagged
pub const ABANDONMENT_THRESHOLD_PERCENT: usize = 25;

/// Served and abandoned counters, shared by every student of a run
#[derive(Debug, Default)]
pub struct Outcomes {
    served: AtomicUsize,
    abandoned: AtomicUsize,
}

impl Outcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_served(&self) {
        self.served.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::SeqCst);
    }

    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }

    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Only meaningful once every student has departed
    pub fn summary(&self, total: usize) -> RunSummary {
        RunSummary::new(total, self.served(), self.abandoned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub served: usize,
    pub abandoned: usize,
    pub percent_abandoned: f64,
    pub threshold_exceeded: bool,
}

impl RunSummary {
    pub fn new(total: usize, served: usize, abandoned: usize) -> Self {
        let percent_abandoned = if total == 0 {
            0.0
        } else {
            abandoned as f64 / total as f64 * 100.0
        };
        // exact comparison, the float above is for display
        let threshold_exceeded = total > 0
            && (abandoned as u128) * 100 >= (total as u128) * ABANDONMENT_THRESHOLD_PERCENT as u128;
        RunSummary {
            total,
            served,
            abandoned,
            percent_abandoned,
            threshold_exceeded,
        }
    }

    /// Every student reached exactly one terminal state
    pub fn is_conserved(&self) -> bool {
        self.served + self.abandoned == self.total
    }

    pub fn verdict(&self) -> &'static str {
        if self.threshold_exceeded { "Yes" } else { "No" }
    }
}
