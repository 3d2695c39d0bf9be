//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Account types and the normal-balance rule
//! - Journal entry drafts
//! - The balanced-entry invariant
//! - Account balance read model and header rollup

pub mod balance;
pub mod entry;
pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, BalanceSource, resolve_balance, rollup_header_balances};
pub use entry::{EntryTotals, JournalEntryDraft, JournalLineDraft};
pub use error::LedgerError;
pub use types::{Account, AccountType, EntrySource, EntryStatus, NormalBalance};
pub use validation::validate_entry;
