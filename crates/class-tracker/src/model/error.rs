//! Error types for configuration validation.

use thiserror::Error;

use super::types::{ClockTime, Weekday};

/// A configuration that deserialized but breaks a schema rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Meetings must end after they start on the same day
    #[error("course {course_id}: meeting on {weekday} ends at {end}, not after its start {start}")]
    EndNotAfterStart {
        course_id: String,
        weekday: Weekday,
        start: ClockTime,
        end: ClockTime,
    },

    /// Two courses share an identifier
    #[error("duplicate course id {course_id}")]
    DuplicateCourseId { course_id: String },

    /// A field that must hold a URL does not parse as one
    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: String, value: String },

    /// The manual-mode zone is not an IANA identifier
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    /// A required text field is blank
    #[error("{field} must not be empty")]
    Blank { field: String },
}
