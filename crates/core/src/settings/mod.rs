//! Company settings snapshot and its process-wide cache.

pub mod cache;
pub mod profile;

pub use cache::SettingsCache;
pub use profile::CompanyProfile;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fiscal::FiscalYearStart;

/// Read-only view of the settings the accounting core depends on.
///
/// Implemented by [`Settings`]. Tests can substitute their own provider.
pub trait SettingsProvider: Send + Sync {
    /// The configured first day of the fiscal year.
    fn fiscal_year_start(&self) -> FiscalYearStart;

    /// Display metadata for statement headers.
    fn company_profile(&self) -> CompanyProfile;
}

/// A snapshot of the company settings row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Company display metadata.
    pub company: CompanyProfile,
    /// First day of the fiscal year.
    pub fiscal_year_start: FiscalYearStart,
    /// When the row was last written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl SettingsProvider for Settings {
    fn fiscal_year_start(&self) -> FiscalYearStart {
        self.fiscal_year_start
    }

    fn company_profile(&self) -> CompanyProfile {
        self.company.clone().with_fallbacks()
    }
}
