//! Period closing rules.
//!
//! Builds the entry that zeroes REVENUE and EXPENSE accounts into retained
//! earnings at period end. Locking, posting and the period record live in
//! the storage layer, which runs them in one transaction.

pub mod error;
pub mod planner;

#[cfg(test)]
mod planner_props;

pub use error::ClosingError;
pub use planner::{
    ClosedAccount, ClosingOutcome, ClosingPlan, ClosingPlanner, ClosingPreview, ClosingRequest,
    ClosingTotals, LastClosingInfo,
};
