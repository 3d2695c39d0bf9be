//! Fiscal year boundaries derived from the configured start (month, day).

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use neraca_shared::types::format_iso_date;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// First day of the fiscal year as a (month, day) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalYearStart {
    month: u32,
    day: u32,
}

/// An inclusive fiscal year date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalRange {
    /// First day of the fiscal year.
    pub start: NaiveDate,
    /// Last day of the fiscal year.
    pub end: NaiveDate,
}

impl FiscalRange {
    /// Returns both bounds as `YYYY-MM-DD` strings.
    #[must_use]
    pub fn to_iso(&self) -> (String, String) {
        (format_iso_date(self.start), format_iso_date(self.end))
    }
}

impl Default for FiscalYearStart {
    fn default() -> Self {
        Self::JANUARY_FIRST
    }
}

impl FiscalYearStart {
    /// Calendar-year fiscal year.
    pub const JANUARY_FIRST: Self = Self { month: 1, day: 1 };

    /// Creates a start from a month (1-12) and day (1-31).
    #[must_use]
    pub fn new(month: u32, day: u32) -> Option<Self> {
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(Self { month, day })
    }

    /// The configured month.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The configured day.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Parses a free-text start such as "January 1", "1 Jan", "01/01" or
    /// "1-1" (numeric forms are month first). Unparseable input falls back
    /// to January 1.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self::try_parse(input).unwrap_or_default()
    }

    /// Like [`FiscalYearStart::parse`] without the fallback.
    #[must_use]
    pub fn try_parse(input: &str) -> Option<Self> {
        let lowered = input.trim().to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| c.is_whitespace() || matches!(c, '/' | '-' | ',' | '.'))
            .filter(|t| !t.is_empty())
            .collect();

        let numbers: Vec<u32> = tokens.iter().filter_map(|t| t.parse().ok()).collect();
        let named_month = tokens.iter().find_map(|t| month_from_name(t));

        match named_month {
            Some(month) => Self::new(month, numbers.first().copied().unwrap_or(1)),
            None if numbers.len() >= 2 => Self::new(numbers[0], numbers[1]),
            None => None,
        }
    }

    /// The boundary date in a given year, with the day clamped to the
    /// length of the month (Feb 29 becomes Feb 28 outside leap years).
    #[must_use]
    pub fn boundary_in(&self, year: i32) -> NaiveDate {
        let mut day = self.day;
        loop {
            if let Some(date) = NaiveDate::from_ymd_opt(year, self.month, day) {
                return date;
            }
            if day <= 28 {
                return NaiveDate::MIN;
            }
            day -= 1;
        }
    }

    /// The fiscal year containing `reference`.
    ///
    /// If `reference` is before this year's boundary the fiscal year started
    /// last year. It ends one day before the following boundary.
    #[must_use]
    pub fn range_for(&self, reference: NaiveDate) -> FiscalRange {
        let this_year = self.boundary_in(reference.year());
        let start = if reference < this_year {
            self.boundary_in(reference.year() - 1)
        } else {
            this_year
        };
        let next = self.boundary_in(start.year() + 1);
        let end = next.checked_sub_days(Days::new(1)).unwrap_or(next);
        FiscalRange { start, end }
    }

    /// The start that follows a period ending on `period_end`.
    #[must_use]
    pub fn following(period_end: NaiveDate) -> Self {
        let next = period_end.succ_opt().unwrap_or(period_end);
        Self {
            month: next.month(),
            day: next.day(),
        }
    }
}

impl fmt::Display for FiscalYearStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = usize::try_from(self.month.saturating_sub(1)).unwrap_or(0);
        write!(f, "{} {}", MONTH_NAMES[index.min(11)], self.day)
    }
}

fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 || !token.chars().all(char::is_alphabetic) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.to_lowercase().starts_with(token))
        .and_then(|index| u32::try_from(index + 1).ok())
}
