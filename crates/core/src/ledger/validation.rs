//! Business rule validation for journal entries.

use rust_decimal::Decimal;

use super::entry::{EntryTotals, JournalEntryDraft};
use super::error::LedgerError;

/// Validates that a journal entry may be posted.
///
/// Rules:
/// - at least 2 lines
/// - every line is one-sided, non-negative and non-zero
/// - total debits equal total credits
///
/// # Errors
///
/// Returns the first rule violation found.
pub fn validate_entry(entry: &JournalEntryDraft) -> Result<EntryTotals, LedgerError> {
    if entry.lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    for (index, line) in entry.lines.iter().enumerate() {
        let line_number = index + 1;
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line: line_number });
        }
        if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
            return Err(LedgerError::BothSides { line: line_number });
        }
        if line.debit.is_zero() && line.credit.is_zero() {
            return Err(LedgerError::ZeroAmount { line: line_number });
        }
    }

    let totals = entry.totals();
    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.total_debit,
            credit: totals.total_credit,
        });
    }

    Ok(totals)
}
