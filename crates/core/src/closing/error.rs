//! Closing error types.

use chrono::NaiveDate;
use thiserror::Error;

use neraca_shared::ErrorKind;
use neraca_shared::types::InvalidDate;

use crate::ledger::LedgerError;

/// Errors raised by closing rules, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClosingError {
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

    /// The retained earnings account does not exist.
    #[error("Retained earnings account {0} not found")]
    RetainedEarningsMissing(String),

    /// The range overlaps a period that is already closed.
    #[error("Period {start} to {end} overlaps closed period {closed_start} to {closed_end}")]
    PeriodOverlap {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
        /// Start of the closed period.
        closed_start: NaiveDate,
        /// End of the closed period.
        closed_end: NaiveDate,
    },

    /// The constructed closing entry failed validation.
    #[error("Closing entry is invalid: {0}")]
    InvalidEntry(#[source] LedgerError),
}

impl ClosingError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::RetainedEarningsMissing(_) => "RETAINED_EARNINGS_MISSING",
            Self::PeriodOverlap { .. } => "PERIOD_OVERLAP",
            Self::InvalidEntry(e) => e.error_code(),
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDate(_) => ErrorKind::InvalidDate,
            Self::InvalidDateRange { .. } => ErrorKind::InvalidInput,
            Self::RetainedEarningsMissing(_) => ErrorKind::MissingRequiredAccount,
            Self::PeriodOverlap { .. } => ErrorKind::Conflict,
            Self::InvalidEntry(e) => e.kind(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
