//! Property-based tests for journal entry validation rules.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use neraca_shared::types::AccountId;

use super::entry::{JournalEntryDraft, JournalLineDraft};
use super::error::LedgerError;
use super::validation::validate_entry;

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn draft(lines: Vec<JournalLineDraft>) -> JournalEntryDraft {
    let mut entry = JournalEntryDraft::new(
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        "Property entry",
    );
    entry.lines = lines;
    entry
}

/// Builds a balanced entry: one credit line per amount, one debit for the sum.
fn balanced_lines(amounts: &[Decimal]) -> Vec<JournalLineDraft> {
    let total: Decimal = amounts.iter().copied().sum();
    let mut lines = vec![JournalLineDraft::debit(AccountId::new(), total, "Debit")];
    lines.extend(
        amounts
            .iter()
            .map(|amount| JournalLineDraft::credit(AccountId::new(), *amount, "Credit")),
    );
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* set of credits offset by one debit for their sum, the entry
    /// validates and its totals match.
    #[test]
    fn prop_balanced_entries_validate(
        amounts in prop::collection::vec(positive_amount(), 1..15),
    ) {
        let entry = draft(balanced_lines(&amounts));
        let totals = validate_entry(&entry);
        prop_assert!(totals.is_ok(), "Balanced entry rejected: {:?}", totals);
        let totals = totals.unwrap();
        prop_assert_eq!(totals.total_debit, totals.total_credit);
    }

    /// *For any* balanced entry, shifting one line by a non-zero delta makes it
    /// unbalanced, and the error reports the actual totals.
    #[test]
    fn prop_perturbed_entries_rejected(
        amounts in prop::collection::vec(positive_amount(), 1..15),
        delta in positive_amount(),
    ) {
        let mut lines = balanced_lines(&amounts);
        lines[0].debit += delta;
        let entry = draft(lines);
        let totals = entry.totals();

        prop_assert_eq!(
            validate_entry(&entry),
            Err(LedgerError::UnbalancedEntry {
                debit: totals.total_debit,
                credit: totals.total_credit,
            })
        );
    }

    /// *For any* signed amount, `signed` produces a one-sided non-negative line
    /// whose debit-positive value equals the input.
    #[test]
    fn prop_signed_line_is_one_sided(cents in -100_000_000i64..100_000_000i64) {
        let amount = Decimal::new(cents, 2);
        let line = JournalLineDraft::signed(AccountId::new(), amount, "Signed");
        prop_assert!(line.debit >= Decimal::ZERO);
        prop_assert!(line.credit >= Decimal::ZERO);
        prop_assert!(line.debit.is_zero() || line.credit.is_zero());
        prop_assert_eq!(line.debit - line.credit, amount);
    }
}
