//! VAT input/output netting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rules::{Bucket, Tag};

/// Code of the consolidated VAT line.
pub const NET_VAT_CODE: &str = "VAT_NET";

/// Display name of a net VAT liability.
pub const NET_PAYABLE_NAME: &str = "Tax Payable, net";

/// Display name of a net VAT asset.
pub const NET_RECEIVABLE_NAME: &str = "Tax Receivable, net";

/// Running VAT input and output totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatNetting {
    /// Sum of VAT input items (asset orientation).
    pub input_total: Decimal,
    /// Sum of VAT output items (liability orientation).
    pub output_total: Decimal,
    /// Number of items absorbed.
    pub items: usize,
}

/// The single line that replaces all VAT items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetVatLine {
    /// Bucket the line is reported under.
    pub bucket: Bucket,
    /// Display name.
    pub name: &'static str,
    /// Non-negative amount in the bucket's orientation.
    pub amount: Decimal,
}

impl VatNetting {
    /// Absorbs an item if it carries a VAT tag. Returns true if it did.
    pub fn absorb(&mut self, tag: Option<Tag>, amount: Decimal) -> bool {
        match tag {
            Some(Tag::VatInput) => self.input_total += amount,
            Some(Tag::VatOutput) => self.output_total += amount,
            _ => return false,
        }
        self.items += 1;
        true
    }

    /// `output - input`. Positive means VAT is owed.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.output_total - self.input_total
    }

    /// Builds the consolidated line, or `None` when nothing was absorbed.
    /// A net of zero is still reported, as a zero liability.
    #[must_use]
    pub fn consolidated(&self) -> Option<NetVatLine> {
        if self.items == 0 {
            return None;
        }
        let net = self.net();
        Some(if net >= Decimal::ZERO {
            NetVatLine {
                bucket: Bucket::TaxPayable,
                name: NET_PAYABLE_NAME,
                amount: net,
            }
        } else {
            NetVatLine {
                bucket: Bucket::OtherCurrentAsset,
                name: NET_RECEIVABLE_NAME,
                amount: net.abs(),
            }
        })
    }
}

/// Nets the given input and output totals.
#[must_use]
pub fn net_vat(input_total: Decimal, output_total: Decimal) -> VatNetting {
    VatNetting {
        input_total,
        output_total,
        items: 2,
    }
}
