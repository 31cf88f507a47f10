//! Crate error type.
//!
//! Only fatal conditions are errors. Under-filled requirements and
//! double-bookings found after generation are reported as
//! [`Conflict`](crate::models::Conflict)s instead.

use thiserror::Error;

use crate::validation::ValidationIssue;

/// Fatal timetable generation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimetableError {
    /// Input failed structural validation.
    #[error("invalid input: {}", summarize(.issues))]
    InvalidInput { issues: Vec<ValidationIssue> },

    /// A time value could not be parsed.
    #[error("malformed time value: {value:?}")]
    MalformedTime { value: String },

    /// The input source failed to load.
    #[error("input source failed: {0}")]
    Source(String),

    /// The persistence sink failed for a reason other than a uniqueness clash.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, TimetableError>;

impl From<Vec<ValidationIssue>> for TimetableError {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self::InvalidInput { issues }
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
