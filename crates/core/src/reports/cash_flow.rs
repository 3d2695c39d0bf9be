//! Cash Flow generation (indirect method).
//!
//! Starts from period net income, adds back non-cash items, then converts
//! each balance sheet account's net change over the range into a signed cash
//! effect:
//! - asset increase: cash outflow (negated)
//! - liability or equity increase: cash inflow (kept)
//!
//! Cash accounts themselves and contra assets are skipped. The latter move
//! in step with the depreciation-style add-backs.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use neraca_shared::types::round_display;

use super::balance_sheet::net_income;
use super::error::ReportError;
use super::period::ReportRange;
use super::types::{
    Activity, ActivitySection, CashFlow, CashFlowItem, CashFlowRatios, FlowCategory, FlowKind,
    OperatingActivities,
};
use crate::classify::{Bucket, Classification, NonCashKind, Tag, classify};
use crate::ledger::{AccountBalance, AccountType, BalanceSource};
use crate::settings::CompanyProfile;

/// Code of the reconciliation line.
pub const RECONCILIATION_CODE: &str = "CASH_RECONCILIATION";

/// Display name of the reconciliation line.
pub const RECONCILIATION_NAME: &str = "Other non-cash items";

/// Everything the generator needs, already read from storage.
#[derive(Debug, Clone)]
pub struct CashFlowInput {
    /// First day of the range.
    pub start: NaiveDate,
    /// Last day of the range.
    pub end: NaiveDate,
    /// Net change of every account over `[start, end + 1 day)`, in normal
    /// orientation, closing entries excluded.
    pub changes: Vec<AccountBalance>,
    /// Cash balance before `start`.
    pub cash_at_beginning: Decimal,
    /// Cash balance before `end + 1 day`.
    pub cash_at_end: Decimal,
    /// Tier that produced `changes`.
    pub data_source: BalanceSource,
    /// Header metadata.
    pub company: CompanyProfile,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// Service for generating the Cash Flow statement.
pub struct CashFlowGenerator;

impl CashFlowGenerator {
    /// Builds the Cash Flow statement.
    ///
    /// After generation `cash_at_end == cash_at_beginning + net_cash_flow`
    /// holds exactly: any gap is folded into other non-cash items and
    /// reported as `reconciliation_adjustment`.
    pub fn generate(input: CashFlowInput) -> Result<CashFlow, ReportError> {
        ReportRange::new(input.start, input.end)?;

        let mut operating = OperatingActivities {
            net_income: net_income(&input.changes),
            ..OperatingActivities::default()
        };
        let mut investing = ActivitySection::default();
        let mut financing = ActivitySection::default();

        for change in input.changes.iter().filter(|c| !c.net_balance.is_zero()) {
            let classification = classify(&change.code, &change.name, change.account_type);
            let Some(item) = Self::cash_effect(change, &classification) else {
                continue;
            };
            if item.category.is_adjustment() {
                operating.adjustments.push(item);
            } else {
                match item.category.activity() {
                    Activity::Operating => {
                        operating.working_capital_changes.push(item);
                    }
                    Activity::Investing => investing.items.push(item),
                    Activity::Financing => financing.items.push(item),
                }
            }
        }

        operating.total_adjustments = sum(&operating.adjustments);
        operating.total_working_capital_changes = sum(&operating.working_capital_changes);
        operating.total = operating.net_income
            + operating.total_adjustments
            + operating.total_working_capital_changes;
        investing.total = sum(&investing.items);
        financing.total = sum(&financing.items);

        let mut net_cash_flow = operating.total + investing.total + financing.total;

        let expected_end = input.cash_at_beginning + net_cash_flow;
        let reconciliation_adjustment = input.cash_at_end - expected_end;
        if !reconciliation_adjustment.is_zero() {
            operating.adjustments.push(CashFlowItem {
                account_id: None,
                code: RECONCILIATION_CODE.to_string(),
                name: RECONCILIATION_NAME.to_string(),
                amount: reconciliation_adjustment,
                kind: FlowKind::change(reconciliation_adjustment),
                category: FlowCategory::OtherNonCashItems,
            });
            operating.total_adjustments += reconciliation_adjustment;
            operating.total += reconciliation_adjustment;
            net_cash_flow += reconciliation_adjustment;
        }

        let ratios = Self::ratios(&operating, &investing);

        Ok(CashFlow {
            currency: input.company.currency.clone(),
            company: input.company,
            start_date: input.start,
            end_date: input.end,
            operating,
            investing,
            financing,
            net_cash_flow,
            cash_at_beginning: input.cash_at_beginning,
            cash_at_end: input.cash_at_end,
            reconciliation_adjustment,
            ratios,
            data_source: input.data_source,
            generated_at: input.generated_at,
        })
    }

    /// Converts one account's net change into a cash flow line.
    ///
    /// Returns `None` for accounts that do not produce a line of their own:
    /// cash, contra assets, retained earnings, and ordinary income statement
    /// accounts (already inside net income).
    #[must_use]
    pub fn cash_effect(
        change: &AccountBalance,
        classification: &Classification,
    ) -> Option<CashFlowItem> {
        let delta = classification.orient(change.net_balance);

        if change.account_type.is_temporary() {
            let Some(Tag::NonCash(kind)) = classification.tag else {
                return None;
            };
            // Expenses are added back; gains (revenue) are taken out.
            let amount = if change.account_type == AccountType::Revenue {
                -delta
            } else {
                delta
            };
            let category = match kind {
                NonCashKind::Depreciation => FlowCategory::Depreciation,
                NonCashKind::Amortization => FlowCategory::Amortization,
                NonCashKind::BadDebt => FlowCategory::BadDebtExpense,
                NonCashKind::DisposalGainLoss => FlowCategory::GainLossOnAssetDisposal,
            };
            return Some(line(
                change,
                change.name.clone(),
                amount,
                FlowKind::change(amount),
                category,
            ));
        }

        if classification.has_tag(Tag::ContraAsset) {
            return None;
        }
        if classification.has_tag(Tag::Dividend) {
            return Some(line(
                change,
                change.name.clone(),
                delta,
                FlowKind::movement(delta),
                FlowCategory::DividendsPaid,
            ));
        }

        let name = match classification.tag {
            Some(Tag::VatInput) => format!("{} (VAT Input)", change.name),
            Some(Tag::VatOutput) => format!("{} (VAT Output)", change.name),
            _ => change.name.clone(),
        };
        let increased = delta > Decimal::ZERO;

        let (amount, category, kind) = match classification.bucket {
            Bucket::Cash | Bucket::RetainedEarnings | Bucket::Revenue | Bucket::Expense => {
                return None;
            }
            // Working capital: assets negated, liabilities kept
            Bucket::Receivables => working(-delta, FlowCategory::AccountsReceivableChange),
            Bucket::Inventory => working(-delta, FlowCategory::InventoryChange),
            Bucket::Prepaid => working(-delta, FlowCategory::PrepaidExpensesChange),
            Bucket::OtherCurrentAsset => working(-delta, FlowCategory::OtherWorkingCapitalChange),
            Bucket::AccountsPayable => working(delta, FlowCategory::AccountsPayableChange),
            Bucket::AccruedLiability => working(delta, FlowCategory::AccruedLiabilitiesChange),
            Bucket::TaxPayable if classification.has_tag(Tag::VatOutput) => {
                working(delta, FlowCategory::OtherWorkingCapitalChange)
            }
            Bucket::TaxPayable => working(delta, FlowCategory::AccruedLiabilitiesChange),
            Bucket::OtherCurrentLiability => {
                working(delta, FlowCategory::OtherWorkingCapitalChange)
            }
            Bucket::DeferredTax => working(delta, FlowCategory::OtherNonCashItems),
            // Investing: positive change is a purchase
            Bucket::FixedAsset => movement(
                -delta,
                if increased {
                    FlowCategory::PurchaseOfFixedAssets
                } else {
                    FlowCategory::SaleOfFixedAssets
                },
            ),
            Bucket::Investment => movement(
                -delta,
                if increased {
                    FlowCategory::PurchaseOfInvestments
                } else {
                    FlowCategory::SaleOfInvestments
                },
            ),
            Bucket::Intangible => movement(
                -delta,
                if increased {
                    FlowCategory::IntangibleAssetPurchases
                } else {
                    FlowCategory::OtherInvestingActivities
                },
            ),
            Bucket::OtherNonCurrentAsset => {
                movement(-delta, FlowCategory::OtherInvestingActivities)
            }
            // Financing: positive change is an increase
            Bucket::ShareCapital => movement(
                delta,
                if increased {
                    FlowCategory::ShareCapitalIncrease
                } else {
                    FlowCategory::ShareCapitalDecrease
                },
            ),
            Bucket::LongTermDebt => movement(
                delta,
                if increased {
                    FlowCategory::LongTermDebtIncrease
                } else {
                    FlowCategory::LongTermDebtDecrease
                },
            ),
            Bucket::ShortTermDebt => movement(
                delta,
                if increased {
                    FlowCategory::ShortTermDebtIncrease
                } else {
                    FlowCategory::ShortTermDebtDecrease
                },
            ),
            Bucket::OtherNonCurrentLiability | Bucket::OtherEquity => {
                movement(delta, FlowCategory::OtherFinancingActivities)
            }
        };

        Some(line(change, name, amount, kind, category))
    }

    fn ratios(operating: &OperatingActivities, investing: &ActivitySection) -> CashFlowRatios {
        let capital_expenditure: Decimal = investing
            .items
            .iter()
            .filter(|item| item.category == FlowCategory::PurchaseOfFixedAssets)
            .map(|item| item.amount)
            .sum();
        let operating_cash_flow_ratio = if operating.net_income.is_zero() {
            Decimal::ZERO
        } else {
            operating
                .total
                .checked_div(operating.net_income)
                .unwrap_or(Decimal::ZERO)
        };

        CashFlowRatios {
            operating_cash_flow_ratio: round_display(operating_cash_flow_ratio),
            free_cash_flow: round_display(operating.total - capital_expenditure.abs()),
        }
    }
}

fn working(amount: Decimal, category: FlowCategory) -> (Decimal, FlowCategory, FlowKind) {
    (amount, category, FlowKind::change(amount))
}

fn movement(amount: Decimal, category: FlowCategory) -> (Decimal, FlowCategory, FlowKind) {
    (amount, category, FlowKind::movement(amount))
}

fn line(
    change: &AccountBalance,
    name: String,
    amount: Decimal,
    kind: FlowKind,
    category: FlowCategory,
) -> CashFlowItem {
    CashFlowItem {
        account_id: Some(change.account_id),
        code: change.code.clone(),
        name,
        amount,
        kind,
        category,
    }
}

fn sum(items: &[CashFlowItem]) -> Decimal {
    items.iter().map(|item| item.amount).sum()
}
