//! Journal entry drafts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use neraca_shared::types::AccountId;

use super::types::EntrySource;

/// One line of a journal entry. Debit and credit are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineDraft {
    /// Account the line posts to.
    pub account_id: AccountId,
    /// Line description.
    pub description: String,
    /// Debit amount (zero for credit lines).
    pub debit: Decimal,
    /// Credit amount (zero for debit lines).
    pub credit: Decimal,
}

impl JournalLineDraft {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            description: description.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            description: description.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    /// Creates a line from a debit-positive signed amount.
    ///
    /// Positive amounts become debits, negative amounts become credits of the
    /// absolute value.
    #[must_use]
    pub fn signed(account_id: AccountId, amount: Decimal, description: impl Into<String>) -> Self {
        if amount.is_sign_negative() {
            Self::credit(account_id, -amount, description)
        } else {
            Self::debit(account_id, amount, description)
        }
    }
}

/// A journal entry before it is numbered and posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryDraft {
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// External reference, if any.
    pub reference: Option<String>,
    /// Where the entry comes from.
    pub source: EntrySource,
    /// True for entries generated by the system.
    pub is_auto_generated: bool,
    /// Ordered lines.
    pub lines: Vec<JournalLineDraft>,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of debit amounts.
    pub total_debit: Decimal,
    /// Sum of credit amounts.
    pub total_credit: Decimal,
}

impl EntryTotals {
    /// Returns true if debits equal credits exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

impl JournalEntryDraft {
    /// Creates a manual entry with no lines.
    #[must_use]
    pub fn new(entry_date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            entry_date,
            description: description.into(),
            reference: None,
            source: EntrySource::Manual,
            is_auto_generated: false,
            lines: Vec::new(),
        }
    }

    /// Appends a line.
    #[must_use]
    pub fn with_line(mut self, line: JournalLineDraft) -> Self {
        self.lines.push(line);
        self
    }

    /// Sets the entry source.
    #[must_use]
    pub fn with_source(mut self, source: EntrySource) -> Self {
        self.source = source;
        self
    }

    /// Computes debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals {
            total_debit: self.lines.iter().map(|l| l.debit).sum(),
            total_credit: self.lines.iter().map(|l| l.credit).sum(),
        }
    }
}
