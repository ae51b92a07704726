//! Error types for schedule queries.

use thiserror::Error;

/// Input the schedule engine refuses. Empty schedules are not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The `now` override is empty or not an ISO-8601 date/time
    #[error("invalid reference instant {value:?}")]
    InvalidReferenceInstant { value: String },

    /// The zone name is not a known IANA identifier
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}
