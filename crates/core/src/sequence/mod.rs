//! Document number sequences.
//!
//! Numbers are issued by the db crate under a row lock; this module owns the
//! document types and the number format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Digits the running number is zero-padded to.
pub const NUMBER_WIDTH: usize = 5;

/// Kind of document a counter numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Sales invoice.
    Invoice,
    /// Sales order.
    SalesOrder,
    /// Quotation.
    Quotation,
    /// Purchase order.
    PurchaseOrder,
    /// Goods receipt.
    Receipt,
    /// Payment.
    Payment,
    /// Journal entry.
    Journal,
}

/// Unknown document type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown document type: {0}")]
pub struct UnknownDocumentType(pub String);

impl DocumentType {
    /// Every document type, in seeding order.
    pub const ALL: [Self; 7] = [
        Self::Invoice,
        Self::SalesOrder,
        Self::Quotation,
        Self::PurchaseOrder,
        Self::Receipt,
        Self::Payment,
        Self::Journal,
    ];

    /// Storage key of the counter row.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "INVOICE",
            Self::SalesOrder => "SALES_ORDER",
            Self::Quotation => "QUOTATION",
            Self::PurchaseOrder => "PURCHASE_ORDER",
            Self::Receipt => "RECEIPT",
            Self::Payment => "PAYMENT",
            Self::Journal => "JOURNAL",
        }
    }

    /// Prefix used when the counter row is first created.
    #[must_use]
    pub const fn default_prefix(self) -> &'static str {
        match self {
            Self::Invoice => "INV",
            Self::SalesOrder => "SOA",
            Self::Quotation => "QT",
            Self::PurchaseOrder => "PO",
            Self::Receipt => "RCV",
            Self::Payment => "PAY",
            Self::Journal => "JE",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    /// Accepts the storage key or the default prefix, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted || t.default_prefix() == wanted)
            .ok_or_else(|| UnknownDocumentType(s.to_string()))
    }
}

/// Formats `<prefix>-<number zero-padded to 5 digits>`.
///
/// Numbers wider than five digits are printed in full.
#[must_use]
pub fn format_document_number(prefix: &str, number: i64) -> String {
    format!("{prefix}-{number:0width$}", width = NUMBER_WIDTH)
}
