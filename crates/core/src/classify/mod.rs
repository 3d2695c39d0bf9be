//! Account classification into statement buckets.
//!
//! [`classify`] is a pure, deterministic lookup over the ordered [`RULES`]
//! table. Both the Balance Sheet and the Cash Flow consume it, so prefix and
//! name rules live in exactly one place.

pub mod rules;
pub mod vat;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountType;

pub use rules::{Bucket, NonCashKind, RULES, Rule, Tag};
pub use vat::{NET_PAYABLE_NAME, NET_RECEIVABLE_NAME, NET_VAT_CODE, NetVatLine, VatNetting, net_vat};

/// Result of classifying one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The account type the rules were evaluated against.
    pub account_type: AccountType,
    /// Assigned bucket.
    pub bucket: Bucket,
    /// Optional marker (VAT, contra, non-cash, dividend).
    pub tag: Option<Tag>,
}

impl Classification {
    /// Re-orients an amount from the account's normal balance to the normal
    /// balance of the bucket's section.
    ///
    /// Only differs from the input when a name rule moved the account to the
    /// opposite side, e.g. an asset-typed "VAT Output" account.
    #[must_use]
    pub fn orient(&self, amount: Decimal) -> Decimal {
        if self.account_type.normal_balance() == self.bucket.section().normal_balance() {
            amount
        } else {
            -amount
        }
    }

    /// Returns true if the classification carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tag == Some(tag)
    }
}

/// Classifies an account of a known type.
#[must_use]
pub fn classify(code: &str, name: &str, account_type: AccountType) -> Classification {
    let code = code.trim();
    let name = name.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(account_type, code, &name))
        .map_or(
            Classification {
                account_type,
                bucket: Bucket::default_for(account_type),
                tag: None,
            },
            |rule| Classification {
                account_type,
                bucket: rule.bucket,
                tag: rule.tag,
            },
        )
}

/// Classifies an account whose type string is not recognized.
///
/// Falls back to the leading digit of the code. Returns `None` when the code
/// gives no hint either.
#[must_use]
pub fn classify_untyped(code: &str, name: &str, account_type: &str) -> Option<Classification> {
    let resolved = account_type
        .parse::<AccountType>()
        .ok()
        .or_else(|| AccountType::from_code_prefix(code))?;
    Some(classify(code, name, resolved))
}
