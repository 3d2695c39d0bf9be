//! Fiscal year and accounting period management.

pub mod period;
pub mod year;

pub use period::{AccountingPeriod, PeriodStatus, date_ranges_overlap};
pub use year::{FiscalRange, FiscalYearStart};
