//! Resolution of report date parameters.
//!
//! Omitted dates default to the fiscal year containing `today`.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use neraca_shared::types::parse_optional_date;

use super::error::ReportError;
use crate::fiscal::FiscalYearStart;

/// An inclusive report range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

impl ReportRange {
    /// Validates and builds a range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The day after `end`, used as an exclusive upper bound in queries.
    #[must_use]
    pub fn end_exclusive(&self) -> NaiveDate {
        next_day(self.end)
    }
}

/// The day after `date`, saturating at the calendar maximum.
#[must_use]
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// Resolves the Balance Sheet date. Defaults to the end of the current fiscal year.
pub fn resolve_as_of(
    input: Option<&str>,
    fiscal_year_start: FiscalYearStart,
    today: NaiveDate,
) -> Result<NaiveDate, ReportError> {
    Ok(parse_optional_date(input)?.unwrap_or_else(|| fiscal_year_start.range_for(today).end))
}

/// Resolves a Cash Flow range. Each missing bound defaults to the matching
/// bound of the current fiscal year.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    fiscal_year_start: FiscalYearStart,
    today: NaiveDate,
) -> Result<ReportRange, ReportError> {
    let fiscal = fiscal_year_start.range_for(today);
    let start = parse_optional_date(start)?.unwrap_or(fiscal.start);
    let end = parse_optional_date(end)?.unwrap_or(fiscal.end);
    ReportRange::new(start, end)
}
