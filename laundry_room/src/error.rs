//! Error types for loading and running laundry room simulations.

use thiserror::Error;

/// Everything that can stop a run before or outside the simulation itself.
///
/// A student leaving without washing is an outcome, not an error, and never
/// shows up here.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended before a required value was read.
    #[error("input ended early: expected {expected}")]
    MissingValue {
        /// Description of the value that was expected next.
        expected: String,
    },

    /// A token could not be parsed as an integer.
    #[error("invalid {field}: '{token}' is not an integer")]
    InvalidNumber {
        /// Which value was being read.
        field: String,
        /// The offending token.
        token: String,
    },

    /// A count or per-student value was negative.
    #[error("{field} must be non-negative, got {value}")]
    Negative {
        /// Which value was being read.
        field: String,
        /// The negative value as read.
        value: i64,
    },

    #[error("a simulation needs at least one student")]
    NoStudents,

    #[error("a simulation needs at least one machine")]
    NoMachines,

    /// Sweep configuration is out of range.
    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),

    /// A distribution rejected its parameters.
    #[error("invalid distribution parameters: {0}")]
    Distribution(String),

    #[error("failed to spawn thread for student {student}: {source}")]
    Spawn {
        student: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("thread for student {0} panicked")]
    StudentPanicked(usize),

    /// A sweep scenario panicked inside the parallel runner.
    #[error("scenario {scenario} failed: {message}")]
    ScenarioFailed { scenario: usize, message: String },

    /// A scenario finished without reporting roster statistics.
    #[error("scenario {0} produced no roster statistics")]
    MissingStats(usize),

    /// A single run finished without reporting roster statistics.
    #[error("run produced no roster statistics")]
    MissingRunStats,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidNumber {
            field: "patience of student 2".to_string(),
            token: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid patience of student 2: 'abc' is not an integer"
        );
    }

    #[test]
    fn negative_display() {
        let err = Error::Negative {
            field: "machine count".to_string(),
            value: -3,
        };
        assert_eq!(err.to_string(), "machine count must be non-negative, got -3");
    }

    #[test]
    fn missing_stats_names_scenario_only_for_sweeps() {
        assert_eq!(
            Error::MissingStats(4).to_string(),
            "scenario 4 produced no roster statistics"
        );
        assert_eq!(
            Error::MissingRunStats.to_string(),
            "run produced no roster statistics"
        );
    }
}
