//! Property-based tests for closing entries.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use neraca_shared::types::{AccountId, within_tolerance};

use super::planner::{ClosingOutcome, ClosingPlanner, ClosingRequest};
use crate::ledger::{Account, AccountType, JournalLineDraft};

/// Signed balance in cents, mostly normal, occasionally abnormal.
fn balance() -> impl Strategy<Value = Decimal> {
    (-50_000i64..5_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account(index: usize, account_type: AccountType, balance: Decimal) -> Account {
    let prefix = if account_type == AccountType::Revenue { 4 } else { 5 };
    Account {
        id: AccountId::new(),
        code: format!("{prefix}{index:03}"),
        name: format!("{account_type} {index}"),
        account_type,
        parent_id: None,
        is_header: false,
        is_active: true,
        balance,
    }
}

/// Applies each line's delta to the stored balances.
fn post(accounts: &mut [Account], retained: &mut Account, lines: &[JournalLineDraft]) {
    for line in lines {
        let target = if line.account_id == retained.id {
            &mut *retained
        } else {
            accounts
                .iter_mut()
                .find(|a| a.id == line.account_id)
                .unwrap()
        };
        target.balance += target.normal_balance().balance_change(line.debit, line.credit);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* set of temporary balances, posting the closing entry zeroes
    /// every closed account and moves retained earnings by net income.
    #[test]
    fn prop_closing_zeroes_temporary_accounts(
        revenues in prop::collection::vec(balance(), 0..8),
        expenses in prop::collection::vec(balance(), 0..8),
        opening in balance(),
    ) {
        let mut accounts: Vec<Account> = revenues
            .iter()
            .enumerate()
            .map(|(i, b)| account(i, AccountType::Revenue, *b))
            .chain(expenses.iter().enumerate().map(|(i, b)| account(i, AccountType::Expense, *b)))
            .collect();
        let mut retained = Account {
            id: AccountId::new(),
            code: "3201".into(),
            name: "Retained Earnings".into(),
            account_type: AccountType::Equity,
            parent_id: None,
            is_header: false,
            is_active: true,
            balance: opening,
        };
        let request = ClosingRequest::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            None,
            None,
        ).unwrap();

        let outcome = ClosingPlanner::plan(&request, "3201", Some(&retained), &accounts, &[]).unwrap();
        match outcome {
            ClosingOutcome::NothingToClose => {
                prop_assert!(accounts.iter().all(|a| within_tolerance(a.balance, Decimal::ZERO)));
            }
            ClosingOutcome::Close(plan) => {
                prop_assert!(plan.entry.totals().is_balanced());
                post(&mut accounts, &mut retained, &plan.entry.lines);

                for account in &accounts {
                    prop_assert!(within_tolerance(account.balance, Decimal::ZERO));
                }
                prop_assert_eq!(retained.balance, opening + plan.totals.net_income);
            }
        }
    }
}
