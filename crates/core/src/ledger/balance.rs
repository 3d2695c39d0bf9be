//! Account balance read model and derivation rules.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use neraca_shared::types::AccountId;

use super::types::{Account, AccountType};

/// Which ledger representation produced a set of balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// The authoritative double-entry journal.
    Journal,
    /// The older simple ledger kept during the transition period.
    Legacy,
    /// Denormalized balances stored on the accounts themselves.
    StoredBalance,
}

/// Aggregated balance of one account at a point in time or over a range.
///
/// Not persisted. Recomputed per query from journal lines or the stored
/// balance fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance in the account's normal orientation.
    pub net_balance: Decimal,
}

impl AccountBalance {
    /// Builds a balance from aggregated line totals.
    #[must_use]
    pub fn from_totals(
        account_id: AccountId,
        code: String,
        name: String,
        account_type: AccountType,
        debit_total: Decimal,
        credit_total: Decimal,
    ) -> Self {
        Self {
            account_id,
            code,
            name,
            account_type,
            debit_total,
            credit_total,
            net_balance: account_type
                .normal_balance()
                .balance_change(debit_total, credit_total),
        }
    }

    /// Builds a balance from an account's stored running balance.
    #[must_use]
    pub fn from_stored(account: &Account) -> Self {
        Self {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            net_balance: account.balance,
        }
    }

    /// Returns true if every amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.debit_total.is_zero() && self.credit_total.is_zero() && self.net_balance.is_zero()
    }
}

/// Resolves an account's balance: journal totals when lines exist, otherwise
/// the stored balance.
///
/// Returns `None` when the result is zero in both totals and fallback, so the
/// account is left out of the statement.
#[must_use]
pub fn resolve_balance(
    account: &Account,
    totals: Option<(Decimal, Decimal)>,
) -> Option<AccountBalance> {
    let balance = match totals {
        Some((debit, credit)) => AccountBalance::from_totals(
            account.id,
            account.code.clone(),
            account.name.clone(),
            account.account_type,
            debit,
            credit,
        ),
        None => AccountBalance::from_stored(account),
    };
    (!balance.is_zero()).then_some(balance)
}

/// Recomputes header balances bottom-up as the sum of their direct children.
///
/// Leaf balances are taken as given. Returns the new balance of every header
/// account. Cycles in the parent chain are cut at the first revisit.
#[must_use]
pub fn rollup_header_balances(accounts: &[Account]) -> HashMap<AccountId, Decimal> {
    let mut children: HashMap<AccountId, Vec<&Account>> = HashMap::new();
    for account in accounts {
        if let Some(parent_id) = account.parent_id {
            children.entry(parent_id).or_default().push(account);
        }
    }

    let mut resolved: HashMap<AccountId, Decimal> = HashMap::new();
    for account in accounts.iter().filter(|a| a.is_header) {
        let mut visiting = Vec::new();
        header_total(account, &children, &mut resolved, &mut visiting);
    }

    accounts
        .iter()
        .filter(|a| a.is_header)
        .filter_map(|a| resolved.get(&a.id).map(|total| (a.id, *total)))
        .collect()
}

fn header_total(
    account: &Account,
    children: &HashMap<AccountId, Vec<&Account>>,
    resolved: &mut HashMap<AccountId, Decimal>,
    visiting: &mut Vec<AccountId>,
) -> Decimal {
    if !account.is_header {
        return account.balance;
    }
    if let Some(total) = resolved.get(&account.id) {
        return *total;
    }
    if visiting.contains(&account.id) {
        return Decimal::ZERO;
    }
    visiting.push(account.id);

    let total = children
        .get(&account.id)
        .map(|kids| {
            kids.iter()
                .map(|child| header_total(child, children, resolved, visiting))
                .sum()
        })
        .unwrap_or(Decimal::ZERO);

    visiting.pop();
    resolved.insert(account.id, total);
    total
}
