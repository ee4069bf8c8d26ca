//! Sweep configuration
//!
//! Loaded from TOML. Every field is optional; missing fields take the
//! defaults below.
//!
//! ```toml
//! scenarios = 100
//! students = 40
//! machines = 3
//! arrival_probability = 0.3
//! wash_mean = 5.0
//! wash_std = 1.5
//! patience_mean = 4.0
//! patience_std = 2.0
//! seed = 42
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Number of independent scenarios to run
    pub scenarios: usize,
    /// Students per scenario
    pub students: usize,
    /// Machines per scenario
    pub machines: usize,
    /// Chance a new student arrives in any given time unit (geometric gaps)
    pub arrival_probability: f64,
    pub wash_mean: f64,
    pub wash_std: f64,
    pub patience_mean: f64,
    pub patience_std: f64,
    /// Scenario `i` is generated from `seed + i`
    pub seed: u64,
    /// Worker threads; rayon's default when absent
    pub threads: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            scenarios: 100,
            students: 40,
            machines: 3,
            arrival_probability: 0.3,
            wash_mean: 5.0,
            wash_std: 1.5,
            patience_mean: 4.0,
            patience_std: 2.0,
            seed: 42,
            threads: None,
        }
    }
}

impl SweepConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading sweep configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SweepConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scenarios == 0 {
            return Err(Error::InvalidConfig("scenarios must be at least 1".into()));
        }
        if self.students == 0 {
            return Err(Error::InvalidConfig("students must be at least 1".into()));
        }
        if self.machines == 0 {
            return Err(Error::InvalidConfig("machines must be at least 1".into()));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig("threads must be at least 1".into()));
        }
        if !(self.arrival_probability > 0.0 && self.arrival_probability <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "arrival_probability must be in (0, 1], got {}",
                self.arrival_probability
            )));
        }
        for (name, value) in [
            ("wash_mean", self.wash_mean),
            ("wash_std", self.wash_std),
            ("patience_mean", self.patience_mean),
            ("patience_std", self.patience_std),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SweepConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = SweepConfig::from_toml_str("machines = 5\nseed = 7\n").unwrap();

        assert_eq!(config.machines, 5);
        assert_eq!(config.seed, 7);
        assert_eq!(config.students, SweepConfig::default().students);
        assert_eq!(config.threads, None);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(
            SweepConfig::from_toml_str("").unwrap(),
            SweepConfig::default()
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = SweepConfig::from_toml_str("washers = 3\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn out_of_range_values_rejected() {
        for contents in [
            "machines = 0",
            "students = 0",
            "scenarios = 0",
            "threads = 0",
            "arrival_probability = 0.0",
            "arrival_probability = 1.5",
            "wash_std = -1.0",
            "patience_mean = -0.5",
        ] {
            let err = SweepConfig::from_toml_str(contents).unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfig(_)),
                "{} should be rejected",
                contents
            );
        }
    }

    #[test]
    fn certain_arrival_allowed() {
        let config = SweepConfig::from_toml_str("arrival_probability = 1.0").unwrap();
        assert_eq!(config.arrival_probability, 1.0);
    }
}
