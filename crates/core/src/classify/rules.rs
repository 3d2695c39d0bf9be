//! Ordered classification rules.
//!
//! Each rule is a predicate over (account type, code prefix, name pattern)
//! plus the bucket and optional tag it assigns. Rules are evaluated top to
//! bottom and the first match wins, so specific name overrides sit above the
//! prefix table and every account type ends with a catch-all.

use serde::{Deserialize, Serialize};

use crate::ledger::AccountType;

/// Statement bucket an account is reported under.
///
/// Declaration order is presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    // ========== Current assets ==========
    /// Cash on hand and bank balances.
    Cash,
    /// Trade and other receivables.
    Receivables,
    /// Inventory.
    Inventory,
    /// Prepaid expenses and advances.
    Prepaid,
    /// Other current assets (including VAT input).
    OtherCurrentAsset,
    // ========== Non-current assets ==========
    /// Property, plant and equipment.
    FixedAsset,
    /// Intangible assets.
    Intangible,
    /// Long-term investments.
    Investment,
    /// Anything else on the asset side.
    OtherNonCurrentAsset,
    // ========== Current liabilities ==========
    /// Trade payables.
    AccountsPayable,
    /// Short-term borrowings.
    ShortTermDebt,
    /// Accrued expenses.
    AccruedLiability,
    /// Taxes payable (including VAT output).
    TaxPayable,
    /// Other current liabilities.
    OtherCurrentLiability,
    // ========== Non-current liabilities ==========
    /// Long-term borrowings.
    LongTermDebt,
    /// Deferred tax liabilities.
    DeferredTax,
    /// Anything else on the liability side.
    OtherNonCurrentLiability,
    // ========== Equity ==========
    /// Paid-in capital.
    ShareCapital,
    /// Retained earnings.
    RetainedEarnings,
    /// Other equity components.
    OtherEquity,
    // ========== Income statement ==========
    /// Revenue accounts.
    Revenue,
    /// Expense accounts.
    Expense,
}

impl Bucket {
    /// Returns the statement section (as an account type) this bucket belongs to.
    #[must_use]
    pub const fn section(self) -> AccountType {
        match self {
            Self::Cash
            | Self::Receivables
            | Self::Inventory
            | Self::Prepaid
            | Self::OtherCurrentAsset
            | Self::FixedAsset
            | Self::Intangible
            | Self::Investment
            | Self::OtherNonCurrentAsset => AccountType::Asset,
            Self::AccountsPayable
            | Self::ShortTermDebt
            | Self::AccruedLiability
            | Self::TaxPayable
            | Self::OtherCurrentLiability
            | Self::LongTermDebt
            | Self::DeferredTax
            | Self::OtherNonCurrentLiability => AccountType::Liability,
            Self::ShareCapital | Self::RetainedEarnings | Self::OtherEquity => AccountType::Equity,
            Self::Revenue => AccountType::Revenue,
            Self::Expense => AccountType::Expense,
        }
    }

    /// Returns true for current assets and current liabilities.
    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(
            self,
            Self::Cash
                | Self::Receivables
                | Self::Inventory
                | Self::Prepaid
                | Self::OtherCurrentAsset
                | Self::AccountsPayable
                | Self::ShortTermDebt
                | Self::AccruedLiability
                | Self::TaxPayable
                | Self::OtherCurrentLiability
        )
    }

    /// Returns the display title of the bucket.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cash => "Cash and Cash Equivalents",
            Self::Receivables => "Accounts Receivable",
            Self::Inventory => "Inventory",
            Self::Prepaid => "Prepaid Expenses",
            Self::OtherCurrentAsset => "Other Current Assets",
            Self::FixedAsset => "Fixed Assets",
            Self::Intangible => "Intangible Assets",
            Self::Investment => "Long-term Investments",
            Self::OtherNonCurrentAsset => "Other Non-current Assets",
            Self::AccountsPayable => "Accounts Payable",
            Self::ShortTermDebt => "Short-term Debt",
            Self::AccruedLiability => "Accrued Liabilities",
            Self::TaxPayable => "Taxes Payable",
            Self::OtherCurrentLiability => "Other Current Liabilities",
            Self::LongTermDebt => "Long-term Debt",
            Self::DeferredTax => "Deferred Tax Liabilities",
            Self::OtherNonCurrentLiability => "Other Non-current Liabilities",
            Self::ShareCapital => "Share Capital",
            Self::RetainedEarnings => "Retained Earnings",
            Self::OtherEquity => "Other Equity",
            Self::Revenue => "Revenue",
            Self::Expense => "Expenses",
        }
    }

    /// Catch-all bucket for an account type.
    #[must_use]
    pub const fn default_for(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Asset => Self::OtherNonCurrentAsset,
            AccountType::Liability => Self::OtherNonCurrentLiability,
            AccountType::Equity => Self::OtherEquity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

/// Kind of non-cash income statement item added back in the cash flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonCashKind {
    /// Depreciation expense.
    Depreciation,
    /// Amortization expense.
    Amortization,
    /// Bad debt expense.
    BadDebt,
    /// Gain or loss on disposal of assets.
    DisposalGainLoss,
}

/// Extra marker attached by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// VAT paid on purchases, netted against VAT output.
    VatInput,
    /// VAT charged on sales, netted against VAT input.
    VatOutput,
    /// Contra-asset whose movement mirrors a non-cash expense.
    ContraAsset,
    /// Non-cash income statement item.
    NonCash(NonCashKind),
    /// Dividends or owner withdrawals.
    Dividend,
}

/// One classification rule. Empty predicate lists match anything.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Account types the rule applies to.
    pub account_types: &'static [AccountType],
    /// Code prefixes, any of which must match.
    pub prefixes: &'static [&'static str],
    /// Lower-case name fragments, any of which must match.
    pub name_patterns: &'static [&'static str],
    /// Bucket assigned on match.
    pub bucket: Bucket,
    /// Tag assigned on match.
    pub tag: Option<Tag>,
}

impl Rule {
    /// Returns true if the rule matches. `name` must already be lower-case.
    #[must_use]
    pub fn matches(&self, account_type: AccountType, code: &str, name: &str) -> bool {
        (self.account_types.is_empty() || self.account_types.contains(&account_type))
            && (self.prefixes.is_empty() || self.prefixes.iter().any(|p| code.starts_with(p)))
            && (self.name_patterns.is_empty() || self.name_patterns.iter().any(|p| name.contains(p)))
    }
}

const fn rule(
    account_types: &'static [AccountType],
    prefixes: &'static [&'static str],
    name_patterns: &'static [&'static str],
    bucket: Bucket,
    tag: Option<Tag>,
) -> Rule {
    Rule {
        account_types,
        prefixes,
        name_patterns,
        bucket,
        tag,
    }
}

const ASSET: &[AccountType] = &[AccountType::Asset];
const LIABILITY: &[AccountType] = &[AccountType::Liability];
const EQUITY: &[AccountType] = &[AccountType::Equity];
const REVENUE: &[AccountType] = &[AccountType::Revenue];
const EXPENSE: &[AccountType] = &[AccountType::Expense];
const ANY: &[AccountType] = &[];

const VAT_INPUT_NAMES: &[&str] = &["vat input", "input vat", "vat receivable", "ppn masukan"];
const VAT_OUTPUT_NAMES: &[&str] = &["vat output", "output vat", "vat payable", "ppn keluaran"];
const TAX_NAMES: &[&str] = &["tax", "pajak", "pph"];
const DISPOSAL_NAMES: &[&str] = &[
    "disposal",
    "sale of asset",
    "sale of fixed asset",
    "penjualan aset",
    "pelepasan aset",
];

/// The classification table, in priority order.
pub static RULES: &[Rule] = &[
    // VAT overrides apply regardless of prefix
    rule(ANY, &[], VAT_INPUT_NAMES, Bucket::OtherCurrentAsset, Some(Tag::VatInput)),
    rule(ANY, &[], VAT_OUTPUT_NAMES, Bucket::TaxPayable, Some(Tag::VatOutput)),
    // Contra assets
    rule(
        ASSET,
        &[],
        &["accumulated depreciation", "akumulasi penyusutan"],
        Bucket::FixedAsset,
        Some(Tag::ContraAsset),
    ),
    rule(
        ASSET,
        &[],
        &["accumulated amortization", "akumulasi amortisasi"],
        Bucket::Intangible,
        Some(Tag::ContraAsset),
    ),
    rule(
        ASSET,
        &[],
        &[
            "allowance for doubtful",
            "allowance for bad debt",
            "cadangan piutang",
            "penyisihan piutang",
        ],
        Bucket::Receivables,
        Some(Tag::ContraAsset),
    ),
    // Non-cash income statement items
    rule(
        EXPENSE,
        &[],
        &["depreciation", "penyusutan"],
        Bucket::Expense,
        Some(Tag::NonCash(NonCashKind::Depreciation)),
    ),
    rule(
        EXPENSE,
        &[],
        &["amortization", "amortisasi"],
        Bucket::Expense,
        Some(Tag::NonCash(NonCashKind::Amortization)),
    ),
    rule(
        EXPENSE,
        &[],
        &["bad debt", "doubtful account", "piutang tak tertagih", "kerugian piutang"],
        Bucket::Expense,
        Some(Tag::NonCash(NonCashKind::BadDebt)),
    ),
    rule(
        EXPENSE,
        &[],
        DISPOSAL_NAMES,
        Bucket::Expense,
        Some(Tag::NonCash(NonCashKind::DisposalGainLoss)),
    ),
    rule(
        REVENUE,
        &[],
        DISPOSAL_NAMES,
        Bucket::Revenue,
        Some(Tag::NonCash(NonCashKind::DisposalGainLoss)),
    ),
    // Distributions to owners
    rule(
        EQUITY,
        &[],
        &["dividend", "dividen", "prive"],
        Bucket::OtherEquity,
        Some(Tag::Dividend),
    ),
    // ========== Asset prefixes ==========
    rule(ASSET, &["110"], &[], Bucket::Cash, None),
    rule(ASSET, &["112", "120"], &[], Bucket::Receivables, None),
    rule(ASSET, &["113", "130"], &[], Bucket::Inventory, None),
    rule(ASSET, &["114", "115"], &[], Bucket::Prepaid, None),
    rule(ASSET, &["11"], &[], Bucket::OtherCurrentAsset, None),
    rule(ASSET, &["12", "16", "17"], &[], Bucket::FixedAsset, None),
    rule(ASSET, &["14"], &[], Bucket::Intangible, None),
    rule(ASSET, &["15"], &[], Bucket::Investment, None),
    rule(ASSET, &[], &[], Bucket::OtherNonCurrentAsset, None),
    // ========== Liability prefixes ==========
    rule(LIABILITY, &["210"], &[], Bucket::AccountsPayable, None),
    rule(LIABILITY, &["211"], &[], Bucket::ShortTermDebt, None),
    rule(LIABILITY, &["212", "213"], TAX_NAMES, Bucket::TaxPayable, None),
    rule(LIABILITY, &["212", "213"], &[], Bucket::AccruedLiability, None),
    rule(LIABILITY, &["21"], &[], Bucket::OtherCurrentLiability, None),
    rule(LIABILITY, &["22"], &[], Bucket::LongTermDebt, None),
    rule(LIABILITY, &["23"], &["tax", "pajak"], Bucket::DeferredTax, None),
    rule(LIABILITY, &["23"], &[], Bucket::OtherNonCurrentLiability, None),
    rule(LIABILITY, &[], &[], Bucket::OtherNonCurrentLiability, None),
    // ========== Equity prefixes ==========
    rule(EQUITY, &["31"], &[], Bucket::ShareCapital, None),
    rule(EQUITY, &["32"], &[], Bucket::RetainedEarnings, None),
    rule(EQUITY, &[], &[], Bucket::OtherEquity, None),
    // ========== Income statement ==========
    rule(REVENUE, &[], &[], Bucket::Revenue, None),
    rule(EXPENSE, &[], &[], Bucket::Expense, None),
];
