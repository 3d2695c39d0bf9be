//! Closing entry construction.
//!
//! Everything here is pure: the storage layer locks and loads accounts,
//! hands them to [`ClosingPlanner`], and posts the resulting draft inside the
//! same transaction.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use neraca_shared::types::{AccountId, UserId, is_material, parse_iso_date};

use super::error::ClosingError;
use crate::fiscal::AccountingPeriod;
use crate::ledger::{
    Account, AccountType, EntrySource, JournalEntryDraft, JournalLineDraft, validate_entry,
};

/// Parameters of a closing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingRequest {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period, also the closing entry date.
    pub end: NaiveDate,
    /// Free-text description stored on the period and the entry.
    pub description: Option<String>,
    /// User performing the closing.
    pub actor: Option<UserId>,
}

impl ClosingRequest {
    /// Builds a request from `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// `InvalidDate` for malformed dates, `InvalidDateRange` when start is
    /// after end.
    pub fn parse(
        start: &str,
        end: &str,
        description: Option<String>,
        actor: Option<UserId>,
    ) -> Result<Self, ClosingError> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?, description, actor)
    }

    /// Builds a request from dates.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` when start is after end.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        description: Option<String>,
        actor: Option<UserId>,
    ) -> Result<Self, ClosingError> {
        if start > end {
            return Err(ClosingError::InvalidDateRange { start, end });
        }
        Ok(Self {
            start,
            end,
            description: description.filter(|d| !d.trim().is_empty()),
            actor,
        })
    }

    /// Description used when the caller gave none.
    #[must_use]
    pub fn description_or_default(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Period closing {} to {}", self.start, self.end))
    }
}

/// A temporary account that the closing entry zeroes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedAccount {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// REVENUE or EXPENSE.
    pub account_type: AccountType,
    /// Balance before closing, in normal orientation.
    pub balance: Decimal,
}

impl From<&Account> for ClosedAccount {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            balance: account.balance,
        }
    }
}

/// Revenue, expense and net income of a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingTotals {
    /// Sum of revenue balances.
    pub total_revenue: Decimal,
    /// Sum of expense balances.
    pub total_expense: Decimal,
    /// `total_revenue - total_expense`.
    pub net_income: Decimal,
}

impl ClosingTotals {
    /// Sums the balances of the given accounts. Non-temporary accounts are ignored.
    #[must_use]
    pub fn of(accounts: &[ClosedAccount]) -> Self {
        let sum_of = |account_type: AccountType| -> Decimal {
            accounts
                .iter()
                .filter(|a| a.account_type == account_type)
                .map(|a| a.balance)
                .sum()
        };
        let total_revenue = sum_of(AccountType::Revenue);
        let total_expense = sum_of(AccountType::Expense);
        Self {
            total_revenue,
            total_expense,
            net_income: total_revenue - total_expense,
        }
    }
}

/// A validated closing entry, ready to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingPlan {
    /// The request the plan was built for.
    pub request: ClosingRequest,
    /// Accounts zeroed by the entry.
    pub accounts: Vec<ClosedAccount>,
    /// Period totals.
    pub totals: ClosingTotals,
    /// Balanced closing entry.
    pub entry: JournalEntryDraft,
}

/// Result of planning a closing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingOutcome {
    /// Every temporary account is already zero.
    NothingToClose,
    /// An entry must be posted.
    Close(ClosingPlan),
}

/// Dry run of a closing, for display before the user confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingPreview {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period.
    pub end: NaiveDate,
    /// True when executing the closing would succeed and post an entry.
    pub can_close: bool,
    /// Revenue accounts that would be closed.
    pub revenue_accounts: Vec<ClosedAccount>,
    /// Expense accounts that would be closed.
    pub expense_accounts: Vec<ClosedAccount>,
    /// Period totals.
    pub totals: ClosingTotals,
    /// Whether the retained earnings account exists.
    pub retained_earnings_exists: bool,
    /// A closed period overlapping the requested range, if any.
    pub overlapping_period: Option<AccountingPeriod>,
    /// Human-readable reasons that block or qualify the closing.
    pub issues: Vec<String>,
}

/// Summary of the most recent closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastClosingInfo {
    /// The latest closed period by end date.
    pub last_period: Option<AccountingPeriod>,
    /// Suggested start of the next period (the day after the last end).
    pub next_start_date: Option<NaiveDate>,
}

impl LastClosingInfo {
    /// Picks the latest period by end date.
    #[must_use]
    pub fn from_periods(periods: &[AccountingPeriod]) -> Self {
        let last_period = periods
            .iter()
            .filter(|p| p.is_closed)
            .max_by_key(|p| p.end_date)
            .cloned();
        let next_start_date = last_period
            .as_ref()
            .and_then(|p| p.end_date.checked_add_days(Days::new(1)));
        Self {
            last_period,
            next_start_date,
        }
    }

    /// Returns true if at least one period has been closed.
    #[must_use]
    pub fn has_previous_closing(&self) -> bool {
        self.last_period.is_some()
    }
}

/// Service for building closing entries.
pub struct ClosingPlanner;

impl ClosingPlanner {
    /// Plans a closing run.
    ///
    /// `temporaries` may contain any accounts; only non-header REVENUE and
    /// EXPENSE accounts whose balance exceeds the tolerance are closed.
    ///
    /// # Errors
    ///
    /// - `RetainedEarningsMissing` when `retained` is `None`
    /// - `PeriodOverlap` when the range overlaps a closed period
    /// - `InvalidEntry` if the constructed entry does not validate
    pub fn plan(
        request: &ClosingRequest,
        retained_code: &str,
        retained: Option<&Account>,
        temporaries: &[Account],
        closed_periods: &[AccountingPeriod],
    ) -> Result<ClosingOutcome, ClosingError> {
        let retained =
            retained.ok_or_else(|| ClosingError::RetainedEarningsMissing(retained_code.into()))?;
        Self::check_overlap(request, closed_periods)?;

        let accounts = Self::closable_accounts(temporaries);
        if accounts.is_empty() {
            return Ok(ClosingOutcome::NothingToClose);
        }

        let totals = ClosingTotals::of(&accounts);
        let entry = Self::closing_entry(request, retained.id, &accounts, totals);
        validate_entry(&entry).map_err(ClosingError::InvalidEntry)?;

        Ok(ClosingOutcome::Close(ClosingPlan {
            request: request.clone(),
            accounts,
            totals,
            entry,
        }))
    }

    /// Describes what [`Self::plan`] would do without failing.
    #[must_use]
    pub fn preview(
        request: &ClosingRequest,
        retained: Option<&Account>,
        temporaries: &[Account],
        closed_periods: &[AccountingPeriod],
    ) -> ClosingPreview {
        let accounts = Self::closable_accounts(temporaries);
        let totals = ClosingTotals::of(&accounts);
        let overlapping_period = closed_periods
            .iter()
            .find(|p| p.is_closed && p.overlaps(request.start, request.end))
            .cloned();

        let mut issues = Vec::new();
        if retained.is_none() {
            issues.push("Retained earnings account not found".to_string());
        }
        if let Some(period) = &overlapping_period {
            issues.push(format!(
                "Overlaps closed period {} to {}",
                period.start_date, period.end_date
            ));
        }
        if accounts.is_empty() {
            issues.push("No revenue or expense balances to close".to_string());
        }

        let (revenue_accounts, expense_accounts) = accounts
            .into_iter()
            .partition(|a| a.account_type == AccountType::Revenue);

        ClosingPreview {
            start: request.start,
            end: request.end,
            can_close: issues.is_empty(),
            revenue_accounts,
            expense_accounts,
            totals,
            retained_earnings_exists: retained.is_some(),
            overlapping_period,
            issues,
        }
    }

    /// Fails when the request overlaps any closed period.
    ///
    /// # Errors
    ///
    /// `PeriodOverlap` naming the first overlapping period.
    pub fn check_overlap(
        request: &ClosingRequest,
        closed_periods: &[AccountingPeriod],
    ) -> Result<(), ClosingError> {
        match closed_periods
            .iter()
            .find(|p| p.is_closed && p.overlaps(request.start, request.end))
        {
            Some(period) => Err(ClosingError::PeriodOverlap {
                start: request.start,
                end: request.end,
                closed_start: period.start_date,
                closed_end: period.end_date,
            }),
            None => Ok(()),
        }
    }

    /// Non-header temporary accounts with a material balance, revenue first.
    #[must_use]
    pub fn closable_accounts(accounts: &[Account]) -> Vec<ClosedAccount> {
        let mut closable: Vec<ClosedAccount> = accounts
            .iter()
            .filter(|a| a.account_type.is_temporary() && !a.is_header)
            .filter(|a| is_material(a.balance))
            .map(ClosedAccount::from)
            .collect();
        closable.sort_by(|a, b| {
            (a.account_type != AccountType::Revenue, &a.code)
                .cmp(&(b.account_type != AccountType::Revenue, &b.code))
        });
        closable
    }

    /// Builds the closing entry.
    ///
    /// Each temporary account gets the line that moves its balance to zero.
    /// Retained earnings is credited with total revenue and debited with
    /// total expense, so the entry balances by construction.
    fn closing_entry(
        request: &ClosingRequest,
        retained_id: AccountId,
        accounts: &[ClosedAccount],
        totals: ClosingTotals,
    ) -> JournalEntryDraft {
        let mut lines: Vec<JournalLineDraft> = accounts
            .iter()
            .map(|account| match account.account_type {
                AccountType::Revenue => JournalLineDraft::signed(
                    account.account_id,
                    account.balance,
                    format!("Close revenue account: {}", account.name),
                ),
                _ => JournalLineDraft::signed(
                    account.account_id,
                    -account.balance,
                    format!("Close expense account: {}", account.name),
                ),
            })
            .collect();

        if !totals.total_revenue.is_zero() {
            lines.push(JournalLineDraft::signed(
                retained_id,
                -totals.total_revenue,
                "Transfer revenue to retained earnings",
            ));
        }
        if !totals.total_expense.is_zero() {
            lines.push(JournalLineDraft::signed(
                retained_id,
                totals.total_expense,
                "Transfer expense from retained earnings",
            ));
        }

        JournalEntryDraft {
            entry_date: request.end,
            description: request.description_or_default(),
            reference: Some(format!("CLOSING-{}-{}", request.start, request.end)),
            source: EntrySource::Closing,
            is_auto_generated: true,
            lines,
        }
    }
}
