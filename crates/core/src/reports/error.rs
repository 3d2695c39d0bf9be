//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

use neraca_shared::ErrorKind;
use neraca_shared::types::InvalidDate;

/// Errors that can occur while resolving report inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A date parameter is not `YYYY-MM-DD`.
    #[error(transparent)]
    InvalidDate(#[from] InvalidDate),

    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}

impl ReportError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDate(_) => ErrorKind::InvalidDate,
            Self::InvalidDateRange { .. } => ErrorKind::InvalidInput,
        }
    }
}
