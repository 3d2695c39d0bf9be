//! Core business logic for Neraca.
//!
//! This crate contains pure accounting logic with ZERO database dependencies.
//! All domain types, validation rules, and statement calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping logic
//! - `classify` - Account classification and VAT netting
//! - `reports` - Balance Sheet and Cash Flow generation
//! - `closing` - Period closing entries
//! - `fiscal` - Fiscal year math and accounting periods
//! - `sequence` - Document number formatting
//! - `settings` - Company settings snapshot and cache
//! - `audit` - Field-level change records

pub mod audit;
pub mod classify;
pub mod closing;
pub mod fiscal;
pub mod ledger;
pub mod reports;
pub mod sequence;
pub mod settings;
