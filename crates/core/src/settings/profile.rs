//! Company profile used in statement headers.

use serde::{Deserialize, Serialize};

/// Company display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Legal name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Phone number.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// Base currency code.
    pub currency: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "PT. Sistem Akuntansi Indonesia".to_string(),
            address: "Jl. Sudirman Kav. 45-46, Jakarta Pusat 10210, Indonesia".to_string(),
            phone: "+62-21-5551234".to_string(),
            email: "info@sistemakuntansi.co.id".to_string(),
            currency: "IDR".to_string(),
        }
    }
}

impl CompanyProfile {
    /// Replaces blank fields with the defaults.
    #[must_use]
    pub fn with_fallbacks(self) -> Self {
        let defaults = Self::default();
        Self {
            name: non_blank(self.name, defaults.name),
            address: non_blank(self.address, defaults.address),
            phone: non_blank(self.phone, defaults.phone),
            email: non_blank(self.email, defaults.email),
            currency: non_blank(self.currency, defaults.currency),
        }
    }
}

fn non_blank(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
