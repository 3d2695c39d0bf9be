//! Accounting period types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use neraca_shared::types::{JournalEntryId, PeriodId, UserId};

/// Lifecycle of an accounting period.
///
/// `Open -> Closing -> Closed`. `Closing` only exists inside the closing
/// transaction and `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period accepts postings.
    Open,
    /// Closing entry is being built and posted.
    Closing,
    /// Temporary accounts have been zeroed. No further postings.
    Closed,
}

impl PeriodStatus {
    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closing) | (Self::Closing, Self::Closed | Self::Open)
        )
    }
}

/// A closed accounting period with its closing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: PeriodId,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Whether the period is closed.
    pub is_closed: bool,
    /// Whether postings into the period are blocked.
    pub is_locked: bool,
    /// Who closed the period.
    pub closed_by: Option<UserId>,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Revenue closed into retained earnings.
    pub total_revenue: Decimal,
    /// Expense closed into retained earnings.
    pub total_expense: Decimal,
    /// `total_revenue - total_expense`.
    pub net_income: Decimal,
    /// The closing journal entry.
    pub closing_entry_id: Option<JournalEntryId>,
}

impl AccountingPeriod {
    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PeriodStatus {
        if self.is_closed {
            PeriodStatus::Closed
        } else {
            PeriodStatus::Open
        }
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if postings dated `date` must be rejected.
    #[must_use]
    pub fn blocks_posting_on(&self, date: NaiveDate) -> bool {
        self.is_closed && self.is_locked && self.contains_date(date)
    }

    /// Returns true if this period shares at least one day with the range.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        date_ranges_overlap(self.start_date, self.end_date, start, end)
    }
}

/// Returns true if two inclusive date ranges share at least one day.
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}
