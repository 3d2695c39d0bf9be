//! `SeaORM` entity definitions.

pub mod accounting_periods;
pub mod accounts;
pub mod company_settings;
pub mod journal_entries;
pub mod journal_lines;
pub mod legacy_journal_entries;
pub mod legacy_journal_lines;
pub mod sea_orm_active_enums;
pub mod sequence_counters;
