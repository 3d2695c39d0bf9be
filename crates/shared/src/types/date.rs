//! ISO-8601 calendar date parsing.
//!
//! Every public entry point accepts dates as `YYYY-MM-DD` strings.

use chrono::NaiveDate;
use thiserror::Error;

/// Input that is not a valid `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date '{0}': expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

/// Parses a strict `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`InvalidDate`] for any other format or an impossible calendar date.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, InvalidDate> {
    let trimmed = input.trim();
    // chrono accepts unpadded fields, the wire format does not
    if trimmed.len() != 10 {
        return Err(InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| InvalidDate(input.to_string()))
}

/// Parses an optional date, treating `None` and blank strings as absent.
///
/// # Errors
///
/// Returns [`InvalidDate`] when a non-blank value is malformed.
pub fn parse_optional_date(input: Option<&str>) -> Result<Option<NaiveDate>, InvalidDate> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_iso_date(value).map(Some),
    }
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
