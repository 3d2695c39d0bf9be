//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use neraca_core::ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "ASSET")]
    Asset,
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    #[sea_orm(string_value = "REVENUE")]
    Revenue,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
pub enum JournalStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "POSTED")]
    Posted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_source")]
pub enum JournalSource {
    #[sea_orm(string_value = "MANUAL")]
    Manual,
    #[sea_orm(string_value = "CLOSING")]
    Closing,
    #[sea_orm(string_value = "ADJUSTMENT")]
    Adjustment,
    #[sea_orm(string_value = "OPENING")]
    Opening,
}

impl From<AccountType> for ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<ledger::AccountType> for AccountType {
    fn from(value: ledger::AccountType) -> Self {
        match value {
            ledger::AccountType::Asset => Self::Asset,
            ledger::AccountType::Liability => Self::Liability,
            ledger::AccountType::Equity => Self::Equity,
            ledger::AccountType::Revenue => Self::Revenue,
            ledger::AccountType::Expense => Self::Expense,
        }
    }
}

impl From<ledger::EntryStatus> for JournalStatus {
    fn from(value: ledger::EntryStatus) -> Self {
        match value {
            ledger::EntryStatus::Draft => Self::Draft,
            ledger::EntryStatus::Posted => Self::Posted,
        }
    }
}

impl From<ledger::EntrySource> for JournalSource {
    fn from(value: ledger::EntrySource) -> Self {
        match value {
            ledger::EntrySource::Manual => Self::Manual,
            ledger::EntrySource::Closing => Self::Closing,
            ledger::EntrySource::Adjustment => Self::Adjustment,
            ledger::EntrySource::Opening => Self::Opening,
        }
    }
}

impl From<JournalSource> for ledger::EntrySource {
    fn from(value: JournalSource) -> Self {
        match value {
            JournalSource::Manual => Self::Manual,
            JournalSource::Closing => Self::Closing,
            JournalSource::Adjustment => Self::Adjustment,
            JournalSource::Opening => Self::Opening,
        }
    }
}

/// Converts a list of domain account types for `is_in` filters.
#[must_use]
pub fn account_types(types: &[ledger::AccountType]) -> Vec<AccountType> {
    types.iter().copied().map(AccountType::from).collect()
}
