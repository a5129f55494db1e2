use std::fmt::{self, Debug, Display};
use std::io;

use crate::schedule::Day;
use crate::PersonIndex;

/// Provides `OutbreakError` and maps other errors to
/// convert to an `OutbreakError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum OutbreakError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A parameter is outside its domain. Raised before any engine exists.
    InvalidConfiguration {
        field: &'static str,
        reason: String,
    },
    /// An event day fell past the schedule horizon under the `Reject` policy.
    ScheduleOverflow {
        person: PersonIndex,
        day: Day,
        horizon: Day,
    },
    /// A day can no longer be simulated: it is at or past the horizon, or already resolved.
    DayClosed {
        day: Day,
        reason: String,
    },
    ReportError(String),
    OutbreakError(String),
}

impl OutbreakError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        OutbreakError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for OutbreakError {
    fn from(error: io::Error) -> Self {
        OutbreakError::IoError(error)
    }
}

impl From<serde_json::Error> for OutbreakError {
    fn from(error: serde_json::Error) -> Self {
        OutbreakError::JsonError(error)
    }
}

impl From<csv::Error> for OutbreakError {
    fn from(error: csv::Error) -> Self {
        OutbreakError::CsvError(error)
    }
}

impl From<String> for OutbreakError {
    fn from(error: String) -> Self {
        OutbreakError::OutbreakError(error)
    }
}

impl From<&str> for OutbreakError {
    fn from(error: &str) -> Self {
        OutbreakError::OutbreakError(error.to_string())
    }
}

impl std::error::Error for OutbreakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutbreakError::IoError(error) => Some(error),
            OutbreakError::JsonError(error) => Some(error),
            OutbreakError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for OutbreakError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutbreakError::InvalidConfiguration { field, reason } => {
                write!(f, "invalid configuration for `{field}`: {reason}")
            }
            OutbreakError::ScheduleOverflow {
                person,
                day,
                horizon,
            } => write!(
                f,
                "event for person {person} on day {day} is past the schedule horizon (day {horizon})"
            ),
            OutbreakError::DayClosed { day, reason } => {
                write!(f, "day {day} cannot be simulated: {reason}")
            }
            OutbreakError::ReportError(message) | OutbreakError::OutbreakError(message) => {
                write!(f, "Error: {message}")
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_names_field() {
        let error = OutbreakError::invalid("r0", "must be positive");
        assert_eq!(
            error.to_string(),
            "invalid configuration for `r0`: must be positive"
        );
    }

    #[test]
    fn schedule_overflow_display() {
        let error = OutbreakError::ScheduleOverflow {
            person: 7,
            day: 400,
            horizon: 365,
        };
        assert_eq!(
            error.to_string(),
            "event for person 7 on day 400 is past the schedule horizon (day 365)"
        );
    }

    #[test]
    fn day_closed_display() {
        let error = OutbreakError::DayClosed {
            day: 30,
            reason: "the schedule horizon is day 30".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "day 30 cannot be simulated: the schedule horizon is day 30"
        );
    }

    #[test]
    fn io_error_has_source() {
        let error: OutbreakError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(std::error::Error::source(&error).is_some());
    }
}
