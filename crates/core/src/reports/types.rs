//! Report data types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use neraca_shared::types::AccountId;

use crate::classify::Bucket;
use crate::ledger::BalanceSource;
use crate::settings::CompanyProfile;

/// Code of the synthetic current period income line.
pub const NET_INCOME_CODE: &str = "NET_INCOME";

/// Display name of the synthetic current period income line.
pub const NET_INCOME_NAME: &str = "Current Period Income";

// ============================================================================
// Balance Sheet
// ============================================================================

/// One displayed line of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Source account. `None` for synthetic lines (net VAT, net income).
    pub account_id: Option<AccountId>,
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Amount in the section's normal orientation.
    pub amount: Decimal,
}

/// All lines of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    /// The bucket.
    pub bucket: Bucket,
    /// Display title.
    pub title: String,
    /// Lines in input order.
    pub items: Vec<LineItem>,
    /// Sum of the lines.
    pub total: Decimal,
}

impl Subsection {
    /// Creates an empty subsection.
    #[must_use]
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            title: bucket.title().to_string(),
            items: Vec::new(),
            total: Decimal::ZERO,
        }
    }
}

/// An ordered group of subsections with a total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Non-empty subsections in bucket order.
    pub subsections: Vec<Subsection>,
    /// Sum of subsection totals.
    pub total: Decimal,
}

impl Group {
    /// Finds a subsection by bucket.
    #[must_use]
    pub fn subsection(&self, bucket: Bucket) -> Option<&Subsection> {
        self.subsections.iter().find(|s| s.bucket == bucket)
    }

    /// Iterates every line in the group.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.subsections.iter().flat_map(|s| s.items.iter())
    }
}

/// Asset or liability side, split into current and non-current.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetSection {
    /// Current items.
    pub current: Group,
    /// Non-current items.
    pub non_current: Group,
    /// `current.total + non_current.total`.
    pub total: Decimal,
}

impl BalanceSheetSection {
    /// Iterates every line in the section.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.current.items().chain(self.non_current.items())
    }

    /// Finds a subsection by bucket.
    #[must_use]
    pub fn subsection(&self, bucket: Bucket) -> Option<&Subsection> {
        self.current
            .subsection(bucket)
            .or_else(|| self.non_current.subsection(bucket))
    }
}

/// Balance Sheet as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Header metadata.
    pub company: CompanyProfile,
    /// Statement date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Assets.
    pub assets: BalanceSheetSection,
    /// Liabilities.
    pub liabilities: BalanceSheetSection,
    /// Equity, including the current period income line when the period is open.
    pub equity: Group,
    /// Current period income added to equity. `None` when the period is closed.
    pub current_period_income: Option<Decimal>,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Total equity.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub total_liabilities_and_equity: Decimal,
    /// `total_assets - total_liabilities_and_equity`.
    pub balance_difference: Decimal,
    /// `|balance_difference| <= 0.01`.
    pub is_balanced: bool,
    /// Ledger tier the balances came from.
    pub data_source: BalanceSource,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Cash Flow
// ============================================================================

/// Direction of a cash flow line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// Working capital or adjustment raising cash.
    Increase,
    /// Working capital or adjustment reducing cash.
    Decrease,
    /// Investing or financing receipt.
    Inflow,
    /// Investing or financing payment.
    Outflow,
}

impl FlowKind {
    /// Increase/decrease by the sign of a cash effect.
    #[must_use]
    pub fn change(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            Self::Decrease
        } else {
            Self::Increase
        }
    }

    /// Inflow/outflow by the sign of a cash effect.
    #[must_use]
    pub fn movement(amount: Decimal) -> Self {
        if amount.is_sign_negative() {
            Self::Outflow
        } else {
            Self::Inflow
        }
    }
}

/// Activity a cash flow category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Operating activities.
    Operating,
    /// Investing activities.
    Investing,
    /// Financing activities.
    Financing,
}

/// Fine-grained cash flow category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowCategory {
    // ========== Operating: non-cash adjustments ==========
    /// Depreciation add-back.
    Depreciation,
    /// Amortization add-back.
    Amortization,
    /// Bad debt add-back.
    BadDebtExpense,
    /// Gain (negative) or loss (positive) on asset disposal.
    GainLossOnAssetDisposal,
    /// Other non-cash items, including the reconciliation adjustment.
    OtherNonCashItems,
    // ========== Operating: working capital ==========
    /// Change in receivables.
    AccountsReceivableChange,
    /// Change in inventory.
    InventoryChange,
    /// Change in prepaid expenses.
    PrepaidExpensesChange,
    /// Change in payables.
    AccountsPayableChange,
    /// Change in accrued liabilities and taxes.
    AccruedLiabilitiesChange,
    /// Other working capital, including VAT.
    OtherWorkingCapitalChange,
    // ========== Investing ==========
    /// Fixed asset purchases.
    PurchaseOfFixedAssets,
    /// Fixed asset sales.
    SaleOfFixedAssets,
    /// Investment purchases.
    PurchaseOfInvestments,
    /// Investment sales.
    SaleOfInvestments,
    /// Intangible asset purchases.
    IntangibleAssetPurchases,
    /// Other investing activities.
    OtherInvestingActivities,
    // ========== Financing ==========
    /// Share capital raised.
    ShareCapitalIncrease,
    /// Share capital returned.
    ShareCapitalDecrease,
    /// Long-term borrowing.
    LongTermDebtIncrease,
    /// Long-term repayment.
    LongTermDebtDecrease,
    /// Short-term borrowing.
    ShortTermDebtIncrease,
    /// Short-term repayment.
    ShortTermDebtDecrease,
    /// Dividends and owner withdrawals.
    DividendsPaid,
    /// Other financing activities.
    OtherFinancingActivities,
}

impl FlowCategory {
    /// The activity this category is reported under.
    #[must_use]
    pub const fn activity(self) -> Activity {
        match self {
            Self::Depreciation
            | Self::Amortization
            | Self::BadDebtExpense
            | Self::GainLossOnAssetDisposal
            | Self::OtherNonCashItems
            | Self::AccountsReceivableChange
            | Self::InventoryChange
            | Self::PrepaidExpensesChange
            | Self::AccountsPayableChange
            | Self::AccruedLiabilitiesChange
            | Self::OtherWorkingCapitalChange => Activity::Operating,
            Self::PurchaseOfFixedAssets
            | Self::SaleOfFixedAssets
            | Self::PurchaseOfInvestments
            | Self::SaleOfInvestments
            | Self::IntangibleAssetPurchases
            | Self::OtherInvestingActivities => Activity::Investing,
            Self::ShareCapitalIncrease
            | Self::ShareCapitalDecrease
            | Self::LongTermDebtIncrease
            | Self::LongTermDebtDecrease
            | Self::ShortTermDebtIncrease
            | Self::ShortTermDebtDecrease
            | Self::DividendsPaid
            | Self::OtherFinancingActivities => Activity::Financing,
        }
    }

    /// Returns true for non-cash adjustments to net income.
    #[must_use]
    pub const fn is_adjustment(self) -> bool {
        matches!(
            self,
            Self::Depreciation
                | Self::Amortization
                | Self::BadDebtExpense
                | Self::GainLossOnAssetDisposal
                | Self::OtherNonCashItems
        )
    }
}

impl fmt::Display for FlowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One cash flow line with its signed cash effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowItem {
    /// Source account. `None` for the reconciliation adjustment.
    pub account_id: Option<AccountId>,
    /// Account code.
    pub code: String,
    /// Display name, with a VAT marker appended for VAT accounts.
    pub name: String,
    /// Signed cash effect: positive raises cash.
    pub amount: Decimal,
    /// Direction.
    pub kind: FlowKind,
    /// Category.
    pub category: FlowCategory,
}

/// Operating activities under the indirect method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingActivities {
    /// Net income for the period.
    pub net_income: Decimal,
    /// Non-cash adjustments.
    pub adjustments: Vec<CashFlowItem>,
    /// Sum of adjustments.
    pub total_adjustments: Decimal,
    /// Working capital changes.
    pub working_capital_changes: Vec<CashFlowItem>,
    /// Sum of working capital changes.
    pub total_working_capital_changes: Decimal,
    /// `net_income + total_adjustments + total_working_capital_changes`.
    pub total: Decimal,
}

/// Investing or financing activities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySection {
    /// Lines.
    pub items: Vec<CashFlowItem>,
    /// Sum of the lines.
    pub total: Decimal,
}

/// Cash flow ratios, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowRatios {
    /// `operating / net_income`, zero when net income is zero.
    pub operating_cash_flow_ratio: Decimal,
    /// `operating - |purchase of fixed assets|`.
    pub free_cash_flow: Decimal,
}

/// Cash Flow statement (indirect method) for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Header metadata.
    pub company: CompanyProfile,
    /// First day of the range.
    pub start_date: NaiveDate,
    /// Last day of the range.
    pub end_date: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Operating activities.
    pub operating: OperatingActivities,
    /// Investing activities.
    pub investing: ActivitySection,
    /// Financing activities.
    pub financing: ActivitySection,
    /// `operating + investing + financing`.
    pub net_cash_flow: Decimal,
    /// Cash balance before `start_date`.
    pub cash_at_beginning: Decimal,
    /// Cash balance at the end of `end_date`.
    pub cash_at_end: Decimal,
    /// Amount folded into other non-cash items so that
    /// `cash_at_end == cash_at_beginning + net_cash_flow`.
    pub reconciliation_adjustment: Decimal,
    /// Ratios.
    pub ratios: CashFlowRatios,
    /// Ledger tier the flows came from.
    pub data_source: BalanceSource,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

impl CashFlow {
    /// Sum of every line in a category.
    #[must_use]
    pub fn category_total(&self, category: FlowCategory) -> Decimal {
        self.items()
            .filter(|item| item.category == category)
            .map(|item| item.amount)
            .sum()
    }

    /// Iterates every line across all activities.
    pub fn items(&self) -> impl Iterator<Item = &CashFlowItem> {
        self.operating
            .adjustments
            .iter()
            .chain(&self.operating.working_capital_changes)
            .chain(&self.investing.items)
            .chain(&self.financing.items)
    }
}
