//! Balance Sheet generation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use neraca_shared::types::{AccountId, within_tolerance};

use super::types::{
    BalanceSheet, BalanceSheetSection, Group, LineItem, NET_INCOME_CODE, NET_INCOME_NAME,
    Subsection,
};
use crate::classify::{Bucket, NET_VAT_CODE, VatNetting, classify};
use crate::ledger::{AccountBalance, AccountType, BalanceSource};
use crate::settings::CompanyProfile;

/// Everything the generator needs, already read from storage.
#[derive(Debug, Clone)]
pub struct BalanceSheetInput {
    /// Statement date.
    pub as_of: NaiveDate,
    /// ASSET, LIABILITY and EQUITY balances as of `as_of`.
    pub balances: Vec<AccountBalance>,
    /// REVENUE and EXPENSE balances as of `as_of`.
    pub income: Vec<AccountBalance>,
    /// Tier that produced `balances`.
    pub data_source: BalanceSource,
    /// Header metadata.
    pub company: CompanyProfile,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// Service for generating the Balance Sheet.
pub struct BalanceSheetGenerator;

impl BalanceSheetGenerator {
    /// Builds the Balance Sheet. Pure and idempotent for a fixed input.
    #[must_use]
    pub fn generate(input: BalanceSheetInput) -> BalanceSheet {
        let mut buckets = BucketSet::default();
        let mut netting = VatNetting::default();
        let mut vat_lines: Vec<(Bucket, AccountId, Decimal)> = Vec::new();

        for balance in input
            .balances
            .iter()
            .filter(|b| AccountType::BALANCE_SHEET.contains(&b.account_type))
            .filter(|b| !b.net_balance.is_zero())
        {
            let classification = classify(&balance.code, &balance.name, balance.account_type);
            let amount = classification.orient(balance.net_balance);

            buckets.push(
                classification.bucket,
                LineItem {
                    account_id: Some(balance.account_id),
                    code: balance.code.clone(),
                    name: balance.name.clone(),
                    amount,
                },
            );
            if netting.absorb(classification.tag, amount) {
                vat_lines.push((classification.bucket, balance.account_id, amount));
            }
        }

        // VAT lines were kept provisionally; replace them with one net line
        for (bucket, account_id, amount) in vat_lines {
            buckets.remove(bucket, account_id, amount);
        }
        if let Some(net) = netting.consolidated() {
            buckets.push(
                net.bucket,
                LineItem {
                    account_id: None,
                    code: NET_VAT_CODE.to_string(),
                    name: net.name.to_string(),
                    amount: net.amount,
                },
            );
        }

        let current_period_income = Self::current_period_income(&input.income);
        if let Some(net_income) = current_period_income {
            buckets.push(
                Bucket::RetainedEarnings,
                LineItem {
                    account_id: None,
                    code: NET_INCOME_CODE.to_string(),
                    name: NET_INCOME_NAME.to_string(),
                    amount: net_income,
                },
            );
        }

        let (assets, liabilities, equity) = buckets.into_sections();
        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total;
        let total_liabilities_and_equity = total_liabilities + total_equity;
        let balance_difference = total_assets - total_liabilities_and_equity;

        BalanceSheet {
            currency: input.company.currency.clone(),
            company: input.company,
            as_of: input.as_of,
            assets,
            liabilities,
            equity,
            current_period_income,
            total_assets,
            total_liabilities,
            total_equity,
            total_liabilities_and_equity,
            balance_difference,
            is_balanced: within_tolerance(total_assets, total_liabilities_and_equity),
            data_source: input.data_source,
            generated_at: input.generated_at,
        }
    }

    /// Net income still sitting in temporary accounts.
    ///
    /// `None` when every REVENUE and EXPENSE balance is zero: the period has
    /// been closed into retained earnings and adding it again would count it
    /// twice.
    #[must_use]
    pub fn current_period_income(income: &[AccountBalance]) -> Option<Decimal> {
        if income.iter().all(|b| b.net_balance.is_zero()) {
            return None;
        }
        Some(net_income(income))
    }
}

/// `sum(revenue net) - sum(expense net)` over temporary account balances.
#[must_use]
pub fn net_income(balances: &[AccountBalance]) -> Decimal {
    balances
        .iter()
        .map(|b| match b.account_type {
            AccountType::Revenue => b.net_balance,
            AccountType::Expense => -b.net_balance,
            _ => Decimal::ZERO,
        })
        .sum()
}

/// Running subsections keyed by bucket, in presentation order.
#[derive(Debug, Default)]
struct BucketSet {
    subsections: BTreeMap<Bucket, Subsection>,
}

impl BucketSet {
    fn push(&mut self, bucket: Bucket, item: LineItem) {
        let subsection = self
            .subsections
            .entry(bucket)
            .or_insert_with(|| Subsection::new(bucket));
        subsection.total += item.amount;
        subsection.items.push(item);
    }

    /// Removes an account's line and decrements the running subtotal.
    fn remove(&mut self, bucket: Bucket, account_id: AccountId, amount: Decimal) {
        let Some(subsection) = self.subsections.get_mut(&bucket) else {
            return;
        };
        subsection
            .items
            .retain(|item| item.account_id != Some(account_id));
        subsection.total -= amount;
        if subsection.items.is_empty() {
            self.subsections.remove(&bucket);
        }
    }

    fn into_sections(self) -> (BalanceSheetSection, BalanceSheetSection, Group) {
        let mut assets = BalanceSheetSection::default();
        let mut liabilities = BalanceSheetSection::default();
        let mut equity = Group::default();

        for (bucket, subsection) in self.subsections {
            let group = match bucket.section() {
                AccountType::Asset if bucket.is_current() => &mut assets.current,
                AccountType::Asset => &mut assets.non_current,
                AccountType::Liability if bucket.is_current() => &mut liabilities.current,
                AccountType::Liability => &mut liabilities.non_current,
                AccountType::Equity => &mut equity,
                AccountType::Revenue | AccountType::Expense => continue,
            };
            group.total += subsection.total;
            group.subsections.push(subsection);
        }

        assets.total = assets.current.total + assets.non_current.total;
        liabilities.total = liabilities.current.total + liabilities.non_current.total;
        (assets, liabilities, equity)
    }
}
