//! Ledger domain types.
//!
//! This module defines the account taxonomy, the normal-balance rule and the
//! lifecycle enums of journal entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use neraca_shared::types::AccountId;

/// Account type in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    /// Resources owned (debit-normal).
    Asset,
    /// Obligations owed (credit-normal).
    Liability,
    /// Owners' residual interest (credit-normal).
    Equity,
    /// Income earned (credit-normal, temporary).
    Revenue,
    /// Costs incurred (debit-normal, temporary).
    Expense,
}

impl AccountType {
    /// All account types in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Types that appear on the Balance Sheet.
    pub const BALANCE_SHEET: [Self; 3] = [Self::Asset, Self::Liability, Self::Equity];

    /// Temporary types zeroed by period closing.
    pub const TEMPORARY: [Self; 2] = [Self::Revenue, Self::Expense];

    /// Returns the side this account type increases on.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for revenue and expense accounts.
    #[must_use]
    pub const fn is_temporary(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }

    /// Infers a type from the leading digit of an account code.
    ///
    /// `1` asset, `2` liability, `3` equity, `4` revenue, `5`-`9` expense.
    #[must_use]
    pub fn from_code_prefix(code: &str) -> Option<Self> {
        match code.trim().chars().next()? {
            '1' => Some(Self::Asset),
            '2' => Some(Self::Liability),
            '3' => Some(Self::Equity),
            '4' => Some(Self::Revenue),
            '5'..='9' => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "EQUITY" => Ok(Self::Equity),
            "REVENUE" => Ok(Self::Revenue),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Normal balance side of an account.
///
/// - Debit-normal (Asset, Expense): balance += debit - credit
/// - Credit-normal (Liability, Equity, Revenue): balance += credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Increases with debits.
    Debit,
    /// Increases with credits.
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for a debit/credit pair.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Converts a balance in this orientation to debit-positive form.
    #[must_use]
    pub fn to_debit_positive(self, balance: Decimal) -> Decimal {
        match self {
            Self::Debit => balance,
            Self::Credit => -balance,
        }
    }
}

/// Journal entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    /// Being prepared, excluded from balances.
    Draft,
    /// Finalized and included in balances (immutable).
    Posted,
}

/// Origin of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntrySource {
    /// Entered by a user.
    Manual,
    /// Generated by period closing.
    Closing,
    /// Correcting or reclassifying entry.
    Adjustment,
    /// Opening balances.
    Opening,
}

impl EntrySource {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Closing => "CLOSING",
            Self::Adjustment => "ADJUSTMENT",
            Self::Opening => "OPENING",
        }
    }
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account as seen by the domain logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Parent header account, if any.
    pub parent_id: Option<AccountId>,
    /// Header accounts aggregate children and are never posted to.
    pub is_header: bool,
    /// Inactive accounts are excluded from statements.
    pub is_active: bool,
    /// Stored running balance in the account's normal orientation.
    pub balance: Decimal,
}

impl Account {
    /// Returns the account's normal balance side.
    #[must_use]
    pub const fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance()
    }
}
