//! Model parameters.
//!
//! Parameters are an immutable struct handed to the engine at construction. They can be built in
//! code, taken from the [`Parameters::covid19`] preset, or loaded from a JSON file:
//!
//! ```json
//! {
//!     "r0": 2.28,
//!     "incubation_days": 5,
//!     "mild_fraction": 0.8,
//!     "mild_recovery_range": { "min": 7, "max": 14 },
//!     "severe_fraction": 0.2,
//!     "severe_recovery_range": { "min": 21, "max": 42 },
//!     "severe_death_range": { "min": 14, "max": 56 },
//!     "fatality_index": 0.034,
//!     "serial_interval_days": 7,
//!     "population_size": 4500
//! }
//! ```
//!
//! `initial_infections`, `horizon_days` and `schedule_overflow` are optional.

use std::fs;
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::OutbreakError;
use crate::schedule::{Day, OverflowPolicy};

/// A half-open range of days, `[min, max)`, counted from the end of incubation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub min: Day,
    pub max: Day,
}

impl DayRange {
    #[must_use]
    pub const fn new(min: Day, max: Day) -> Self {
        DayRange { min, max }
    }

    fn validate(self, field: &'static str) -> Result<(), OutbreakError> {
        if self.min >= self.max {
            return Err(OutbreakError::invalid(
                field,
                format!("min ({}) must be less than max ({})", self.min, self.max),
            ));
        }
        Ok(())
    }
}

fn default_initial_infections() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Expected new cases per cumulative case per exposure cycle.
    pub r0: f64,
    pub incubation_days: Day,
    pub mild_fraction: f64,
    pub mild_recovery_range: DayRange,
    pub severe_fraction: f64,
    pub severe_recovery_range: DayRange,
    pub severe_death_range: DayRange,
    /// Share of all infections that die. Bounded by `severe_fraction`.
    pub fatality_index: f64,
    pub serial_interval_days: Day,
    pub population_size: usize,
    #[serde(default = "default_initial_infections")]
    pub initial_infections: usize,
    /// Number of schedulable days. `None` leaves the schedule unbounded.
    #[serde(default)]
    pub horizon_days: Option<Day>,
    #[serde(default)]
    pub schedule_overflow: OverflowPolicy,
}

impl Parameters {
    /// The COVID-19 parameterization: 4500 people, one index case, a 365 day horizon.
    #[must_use]
    pub fn covid19() -> Self {
        Parameters {
            r0: 2.28,
            incubation_days: 5,
            mild_fraction: 0.8,
            mild_recovery_range: DayRange::new(7, 14),
            severe_fraction: 0.2,
            severe_recovery_range: DayRange::new(21, 42),
            severe_death_range: DayRange::new(14, 56),
            fatality_index: 0.034,
            serial_interval_days: 7,
            population_size: 4500,
            initial_infections: 1,
            horizon_days: Some(365),
            schedule_overflow: OverflowPolicy::Clamp,
        }
    }

    /// Loads and validates parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an `OutbreakError` if the file cannot be read, is not valid JSON for this struct,
    /// or fails [`Parameters::validate`].
    pub fn from_json_file(path: &Path) -> Result<Self, OutbreakError> {
        trace!("loading parameters from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// # Errors
    ///
    /// Returns an `OutbreakError` if `json` does not describe a valid parameter set.
    pub fn from_json_str(json: &str) -> Result<Self, OutbreakError> {
        let parameters: Parameters = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks every parameter against its domain.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::InvalidConfiguration` naming the first offending field.
    pub fn validate(&self) -> Result<(), OutbreakError> {
        if !self.r0.is_finite() || self.r0 <= 0.0 {
            return Err(OutbreakError::invalid(
                "r0",
                format!("must be a positive number, got {}", self.r0),
            ));
        }
        validate_fraction("mild_fraction", self.mild_fraction)?;
        validate_fraction("severe_fraction", self.severe_fraction)?;
        if self.mild_fraction + self.severe_fraction > 1.0 {
            return Err(OutbreakError::invalid(
                "severe_fraction",
                format!(
                    "mild_fraction + severe_fraction must not exceed 1, got {}",
                    self.mild_fraction + self.severe_fraction
                ),
            ));
        }
        if !(0.0..=self.severe_fraction).contains(&self.fatality_index) {
            return Err(OutbreakError::invalid(
                "fatality_index",
                format!(
                    "must be in [0, severe_fraction = {}], got {}",
                    self.severe_fraction, self.fatality_index
                ),
            ));
        }
        self.mild_recovery_range.validate("mild_recovery_range")?;
        self.severe_recovery_range.validate("severe_recovery_range")?;
        self.severe_death_range.validate("severe_death_range")?;
        if self.serial_interval_days == 0 {
            return Err(OutbreakError::invalid(
                "serial_interval_days",
                "must be greater than 0",
            ));
        }
        if self.population_size == 0 {
            return Err(OutbreakError::invalid(
                "population_size",
                "must be greater than 0",
            ));
        }
        if self.initial_infections == 0 || self.initial_infections > self.population_size {
            return Err(OutbreakError::invalid(
                "initial_infections",
                format!(
                    "must be in [1, population_size = {}], got {}",
                    self.population_size, self.initial_infections
                ),
            ));
        }
        if self.horizon_days == Some(0) {
            return Err(OutbreakError::invalid(
                "horizon_days",
                "must be greater than 0 when set",
            ));
        }
        Ok(())
    }

    /// Day offsets, from the infection day, at which mild cases may recover.
    #[must_use]
    pub fn mild_window(&self) -> DayRange {
        self.after_incubation(self.mild_recovery_range)
    }

    #[must_use]
    pub fn severe_recovery_window(&self) -> DayRange {
        self.after_incubation(self.severe_recovery_range)
    }

    #[must_use]
    pub fn severe_death_window(&self) -> DayRange {
        self.after_incubation(self.severe_death_range)
    }

    fn after_incubation(&self, range: DayRange) -> DayRange {
        DayRange::new(
            self.incubation_days + range.min,
            self.incubation_days + range.max,
        )
    }

    /// Share of severe cases that recover: `1 - fatality_index / severe_fraction`.
    #[must_use]
    pub fn severe_recovery_fraction(&self) -> f64 {
        if self.severe_fraction == 0.0 {
            1.0
        } else {
            1.0 - self.fatality_index / self.severe_fraction
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::covid19()
    }
}

fn validate_fraction(field: &'static str, value: f64) -> Result<(), OutbreakError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(OutbreakError::invalid(
            field,
            format!("must be in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_approx_eq::assert_approx_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn invalid_field(parameters: &Parameters) -> &'static str {
        match parameters.validate() {
            Err(OutbreakError::InvalidConfiguration { field, .. }) => field,
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn covid19_preset_is_valid() {
        let parameters = Parameters::covid19();
        assert!(parameters.validate().is_ok());
        assert_eq!(parameters.mild_window(), DayRange::new(12, 19));
        assert_eq!(parameters.severe_recovery_window(), DayRange::new(26, 47));
        assert_eq!(parameters.severe_death_window(), DayRange::new(19, 61));
        assert_approx_eq!(parameters.severe_recovery_fraction(), 0.83);
    }

    #[test]
    fn rejects_fractions_over_one() {
        let parameters = Parameters {
            mild_fraction: 0.9,
            severe_fraction: 0.2,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "severe_fraction");
    }

    #[test]
    fn rejects_fatality_above_severe_fraction() {
        let parameters = Parameters {
            fatality_index: 0.25,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "fatality_index");
    }

    #[test]
    fn rejects_zero_serial_interval_and_population() {
        let parameters = Parameters {
            serial_interval_days: 0,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "serial_interval_days");

        let parameters = Parameters {
            population_size: 0,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "population_size");
    }

    #[test]
    fn rejects_bad_r0_and_ranges() {
        let parameters = Parameters {
            r0: 0.0,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "r0");

        let parameters = Parameters {
            r0: f64::NAN,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "r0");

        let parameters = Parameters {
            severe_death_range: DayRange::new(20, 20),
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "severe_death_range");
    }

    #[test]
    fn rejects_bad_initial_infections_and_horizon() {
        let parameters = Parameters {
            population_size: 10,
            initial_infections: 11,
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "initial_infections");

        let parameters = Parameters {
            horizon_days: Some(0),
            ..Parameters::covid19()
        };
        assert_eq!(invalid_field(&parameters), "horizon_days");
    }

    #[test]
    fn zero_severe_fraction_recovers_everyone() {
        let parameters = Parameters {
            mild_fraction: 1.0,
            severe_fraction: 0.0,
            fatality_index: 0.0,
            ..Parameters::covid19()
        };
        assert!(parameters.validate().is_ok());
        assert_approx_eq!(parameters.severe_recovery_fraction(), 1.0);
    }

    #[test]
    fn loads_json_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "r0": 2.28,
                "incubation_days": 5,
                "mild_fraction": 0.8,
                "mild_recovery_range": {{ "min": 7, "max": 14 }},
                "severe_fraction": 0.2,
                "severe_recovery_range": {{ "min": 21, "max": 42 }},
                "severe_death_range": {{ "min": 14, "max": 56 }},
                "fatality_index": 0.034,
                "serial_interval_days": 7,
                "population_size": 100
            }}"#
        )
        .unwrap();

        let parameters = Parameters::from_json_file(file.path()).unwrap();
        assert_eq!(parameters.population_size, 100);
        assert_eq!(parameters.initial_infections, 1);
        assert_eq!(parameters.horizon_days, None);
        assert_eq!(parameters.schedule_overflow, OverflowPolicy::Clamp);
    }

    #[test]
    fn json_is_validated_on_load() {
        let mut json = serde_json::to_value(Parameters::covid19()).unwrap();
        json["fatality_index"] = serde_json::json!(0.5);
        let error = Parameters::from_json_str(&json.to_string()).unwrap_err();
        assert!(matches!(
            error,
            OutbreakError::InvalidConfiguration {
                field: "fatality_index",
                ..
            }
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut json = serde_json::to_value(Parameters::covid19()).unwrap();
        json["contact_radius"] = serde_json::json!(3);
        assert!(matches!(
            Parameters::from_json_str(&json.to_string()),
            Err(OutbreakError::JsonError(_))
        ));
    }
}
