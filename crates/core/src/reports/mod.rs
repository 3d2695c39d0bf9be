//! Financial statement generation.
//!
//! Pure generators over balances already read from storage:
//! - Balance Sheet as of a date, with VAT netting and current period income
//! - Cash Flow over a date range, indirect method, with cash reconciliation
//!
//! Storage orchestration (consistent snapshot, fallback chain) lives in the
//! db crate.

pub mod balance_sheet;
pub mod cash_flow;
pub mod error;
pub mod period;
pub mod types;

#[cfg(test)]
mod tests;

pub use balance_sheet::{BalanceSheetGenerator, BalanceSheetInput, net_income};
pub use cash_flow::{CashFlowGenerator, CashFlowInput, RECONCILIATION_CODE, RECONCILIATION_NAME};
pub use error::ReportError;
pub use period::{ReportRange, next_day, resolve_as_of, resolve_range};
pub use types::*;
