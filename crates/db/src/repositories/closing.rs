//! Period closing repository.
//!
//! A closing run is one database transaction:
//!
//! 1. lock the retained earnings account
//! 2. check the range against closed periods
//! 3. lock and load every temporary account
//! 4. post the closing entry
//! 5. record the accounting period as closed
//! 6. advance the fiscal year start
//!
//! Any failure rolls the whole run back and names the step that failed.
//! Audit records and cache invalidation happen only after commit.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use neraca_core::audit::{AuditAction, AuditRecord, AuditSink, FieldChange};
use neraca_core::closing::{
    ClosedAccount, ClosingError, ClosingOutcome, ClosingPlanner, ClosingPreview, ClosingRequest,
    ClosingTotals, LastClosingInfo,
};
use neraca_core::fiscal::{AccountingPeriod, FiscalYearStart};
use neraca_core::ledger::{Account, AccountType};
use neraca_core::settings::SettingsCache;
use neraca_shared::ErrorKind;
use neraca_shared::types::{JournalEntryId, PeriodId};

use crate::entities::{accounting_periods, accounts, sea_orm_active_enums::account_types};
use crate::error::{DbResultExt, StorageFailure};
use crate::repositories::posting::{PostingError, closed_period_containing, post_entry_in};
use crate::repositories::settings::set_fiscal_year_start;

/// Steps of a closing run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingStep {
    /// Opening the transaction.
    Begin,
    /// Locking the retained earnings account.
    LockRetainedEarnings,
    /// Checking for overlap with closed periods.
    CheckPeriodOverlap,
    /// Locking and loading revenue and expense accounts.
    LoadTemporaryAccounts,
    /// Posting the closing entry.
    PostClosingEntry,
    /// Writing the accounting period row.
    RecordAccountingPeriod,
    /// Advancing the fiscal year start.
    UpdateFiscalYearStart,
    /// Committing the transaction.
    Commit,
}

impl ClosingStep {
    /// Returns the step name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin transaction",
            Self::LockRetainedEarnings => "lock retained earnings",
            Self::CheckPeriodOverlap => "check period overlap",
            Self::LoadTemporaryAccounts => "load temporary accounts",
            Self::PostClosingEntry => "post closing entry",
            Self::RecordAccountingPeriod => "record accounting period",
            Self::UpdateFiscalYearStart => "update fiscal year start",
            Self::Commit => "commit",
        }
    }

    /// The step a planning rule belongs to.
    const fn for_rule(error: &ClosingError) -> Self {
        match error {
            ClosingError::RetainedEarningsMissing(_) => Self::LockRetainedEarnings,
            ClosingError::InvalidEntry(_) => Self::PostClosingEntry,
            ClosingError::InvalidDate(_)
            | ClosingError::InvalidDateRange { .. }
            | ClosingError::PeriodOverlap { .. } => Self::CheckPeriodOverlap,
        }
    }
}

impl fmt::Display for ClosingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for period closing.
#[derive(Debug, thiserror::Error)]
pub enum PeriodClosingError {
    /// A closing rule rejected the run.
    #[error("Period closing failed at step '{step}': {source}")]
    Rule {
        /// Failing step.
        step: ClosingStep,
        /// Rule violation.
        #[source]
        source: ClosingError,
    },

    /// The closing entry could not be posted.
    #[error("Period closing failed at step '{step}': {source}")]
    Posting {
        /// Failing step.
        step: ClosingStep,
        /// Posting failure.
        #[source]
        source: PostingError,
    },

    /// Storage failure.
    #[error("Period closing failed at step '{step}': {source}")]
    Storage {
        /// Failing step.
        step: ClosingStep,
        /// Storage failure.
        #[source]
        source: StorageFailure,
    },
}

impl PeriodClosingError {
    /// The step that failed.
    #[must_use]
    pub const fn step(&self) -> ClosingStep {
        match self {
            Self::Rule { step, .. } | Self::Posting { step, .. } | Self::Storage { step, .. } => {
                *step
            }
        }
    }

    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rule { source, .. } => source.error_code(),
            Self::Posting { source, .. } => source.error_code(),
            Self::Storage { .. } => "STORAGE_FAILURE",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rule { source, .. } => source.kind(),
            Self::Posting { source, .. } => source.kind(),
            Self::Storage { source, .. } => source.kind(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<ClosingError> for PeriodClosingError {
    fn from(source: ClosingError) -> Self {
        Self::Rule {
            step: ClosingStep::for_rule(&source),
            source,
        }
    }
}

/// Tags a step result with the step it came from.
trait AtStep<T> {
    fn at(self, step: ClosingStep) -> Result<T, PeriodClosingError>;
}

impl<T> AtStep<T> for Result<T, DbErr> {
    fn at(self, step: ClosingStep) -> Result<T, PeriodClosingError> {
        self.map_err(|source| PeriodClosingError::Storage {
            step,
            source: StorageFailure {
                context: step.as_str(),
                source,
            },
        })
    }
}

impl<T> AtStep<T> for Result<T, PostingError> {
    fn at(self, step: ClosingStep) -> Result<T, PeriodClosingError> {
        self.map_err(|source| PeriodClosingError::Posting { step, source })
    }
}

/// A completed closing.
#[derive(Debug, Clone)]
pub struct ClosingSummary {
    /// The period row that was written.
    pub period: AccountingPeriod,
    /// Closing entry ID.
    pub entry_id: JournalEntryId,
    /// Closing entry number.
    pub entry_number: String,
    /// Accounts that were zeroed.
    pub closed_accounts: Vec<ClosedAccount>,
    /// Revenue, expense and net income that moved to retained earnings.
    pub totals: ClosingTotals,
    /// The fiscal year start in effect after the closing.
    pub next_fiscal_year_start: FiscalYearStart,
}

/// Result of a closing run.
#[derive(Debug, Clone)]
pub enum ClosingResult {
    /// Every revenue and expense account was already zero. Nothing was written.
    NothingToClose,
    /// The period was closed.
    Closed(ClosingSummary),
}

/// Period closing repository.
#[derive(Clone)]
pub struct PeriodClosingRepository {
    db: DatabaseConnection,
    settings: SettingsCache,
    audit: Arc<dyn AuditSink>,
    retained_earnings_code: String,
}

impl PeriodClosingRepository {
    /// Creates a new period closing repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        settings: SettingsCache,
        audit: Arc<dyn AuditSink>,
        retained_earnings_code: impl Into<String>,
    ) -> Self {
        Self {
            db,
            settings,
            audit,
            retained_earnings_code: retained_earnings_code.into(),
        }
    }

    /// Closes a period atomically.
    ///
    /// # Errors
    ///
    /// Returns an error naming the failing step if:
    /// - The retained earnings account does not exist
    /// - The range overlaps a closed period
    /// - The closing entry cannot be posted
    /// - Database operation fails
    pub async fn execute(
        &self,
        request: &ClosingRequest,
    ) -> Result<ClosingResult, PeriodClosingError> {
        let txn = self.db.begin().await.at(ClosingStep::Begin)?;

        let retained = lock_account_by_code(&txn, &self.retained_earnings_code)
            .await
            .at(ClosingStep::LockRetainedEarnings)?;
        let closed = closed_periods(&txn)
            .await
            .at(ClosingStep::CheckPeriodOverlap)?;
        let temporaries = lock_temporary_accounts(&txn)
            .await
            .at(ClosingStep::LoadTemporaryAccounts)?;

        let plan = match ClosingPlanner::plan(
            request,
            &self.retained_earnings_code,
            retained.as_ref(),
            &temporaries,
            &closed,
        )? {
            ClosingOutcome::NothingToClose => {
                txn.rollback().await.at(ClosingStep::Commit)?;
                info!(start = %request.start, end = %request.end, "Nothing to close");
                return Ok(ClosingResult::NothingToClose);
            }
            ClosingOutcome::Close(plan) => plan,
        };

        let posted = post_entry_in(&txn, &plan.entry, request.actor)
            .await
            .at(ClosingStep::PostClosingEntry)?;

        let now: DateTime<FixedOffset> = Utc::now().into();
        let period_id = PeriodId::new();
        let period = accounting_periods::ActiveModel {
            id: Set(period_id.into_inner()),
            start_date: Set(request.start),
            end_date: Set(request.end),
            description: Set(request.description_or_default()),
            is_closed: Set(true),
            is_locked: Set(true),
            closed_by: Set(request.actor.map(|u| u.into_inner())),
            closed_at: Set(Some(now)),
            total_revenue: Set(plan.totals.total_revenue),
            total_expense: Set(plan.totals.total_expense),
            net_income: Set(plan.totals.net_income),
            closing_entry_id: Set(Some(posted.id.into_inner())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .at(ClosingStep::RecordAccountingPeriod)?;

        let next_start = FiscalYearStart::following(request.end);
        let settings_audit = set_fiscal_year_start(&txn, next_start)
            .await
            .at(ClosingStep::UpdateFiscalYearStart)?;

        txn.commit().await.at(ClosingStep::Commit)?;

        self.settings.invalidate();
        let period = AccountingPeriod::from(period);
        let mut records = posted.audit;
        records.push(closing_audit(&period));
        records.extend(settings_audit);
        self.audit.record_all(records);

        info!(
            start = %period.start_date,
            end = %period.end_date,
            entry_number = %posted.entry_number,
            net_income = %plan.totals.net_income,
            accounts = plan.accounts.len(),
            "Closed accounting period"
        );

        Ok(ClosingResult::Closed(ClosingSummary {
            period,
            entry_id: posted.id,
            entry_number: posted.entry_number,
            closed_accounts: plan.accounts,
            totals: plan.totals,
            next_fiscal_year_start: next_start,
        }))
    }

    /// Describes what [`Self::execute`] would do, without locking or writing.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn preview(&self, request: &ClosingRequest) -> Result<ClosingPreview, StorageFailure> {
        let retained = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(self.retained_earnings_code.as_str()))
            .filter(accounts::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("load retained earnings")?
            .map(Account::from);
        let temporaries = temporary_accounts_query()
            .all(&self.db)
            .await
            .context("load temporary accounts")?
            .into_iter()
            .map(Account::from)
            .collect::<Vec<_>>();
        let closed = closed_periods(&self.db)
            .await
            .context("load closed periods")?;

        let preview = ClosingPlanner::preview(request, retained.as_ref(), &temporaries, &closed);
        if !preview.can_close {
            warn!(issues = ?preview.issues, "Closing preview reports blocking issues");
        }
        Ok(preview)
    }

    /// Returns the most recent closing and the suggested next start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn last_closing_info(&self) -> Result<LastClosingInfo, StorageFailure> {
        let periods = closed_periods(&self.db)
            .await
            .context("load closed periods")?;
        Ok(LastClosingInfo::from_periods(&periods))
    }

    /// Returns every closed period, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn closed_periods(&self) -> Result<Vec<AccountingPeriod>, StorageFailure> {
        let mut periods = closed_periods(&self.db)
            .await
            .context("load closed periods")?;
        periods.reverse();
        Ok(periods)
    }

    /// Returns true if `date` falls inside a closed and locked period.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn is_date_in_closed_period(&self, date: NaiveDate) -> Result<bool, StorageFailure> {
        Ok(closed_period_containing(&self.db, date)
            .await
            .context("check closed periods")?
            .is_some())
    }

    /// Returns the period (closed or not) containing `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn period_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<AccountingPeriod>, StorageFailure> {
        Ok(accounting_periods::Entity::find()
            .filter(accounting_periods::Column::StartDate.lte(date))
            .filter(accounting_periods::Column::EndDate.gte(date))
            .order_by_desc(accounting_periods::Column::EndDate)
            .one(&self.db)
            .await
            .context("find period for date")?
            .map(AccountingPeriod::from))
    }
}

impl fmt::Debug for PeriodClosingRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodClosingRepository")
            .field("retained_earnings_code", &self.retained_earnings_code)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Queries
// ============================================================================

async fn lock_account_by_code<C: ConnectionTrait>(
    txn: &C,
    code: &str,
) -> Result<Option<Account>, DbErr> {
    Ok(accounts::Entity::find()
        .filter(accounts::Column::Code.eq(code))
        .filter(accounts::Column::DeletedAt.is_null())
        .lock_exclusive()
        .one(txn)
        .await?
        .map(Account::from))
}

fn temporary_accounts_query() -> sea_orm::Select<accounts::Entity> {
    accounts::Entity::find()
        .filter(accounts::Column::AccountType.is_in(account_types(&AccountType::TEMPORARY)))
        .filter(accounts::Column::IsHeader.eq(false))
        .filter(accounts::Column::DeletedAt.is_null())
        .order_by_asc(accounts::Column::Id)
}

async fn lock_temporary_accounts<C: ConnectionTrait>(txn: &C) -> Result<Vec<Account>, DbErr> {
    Ok(temporary_accounts_query()
        .lock_exclusive()
        .all(txn)
        .await?
        .into_iter()
        .map(Account::from)
        .collect())
}

/// Closed periods ordered by end date, oldest first.
async fn closed_periods<C: ConnectionTrait>(db: &C) -> Result<Vec<AccountingPeriod>, DbErr> {
    Ok(accounting_periods::Entity::find()
        .filter(accounting_periods::Column::IsClosed.eq(true))
        .order_by_asc(accounting_periods::Column::EndDate)
        .all(db)
        .await?
        .into_iter()
        .map(AccountingPeriod::from)
        .collect())
}

fn closing_audit(period: &AccountingPeriod) -> AuditRecord {
    AuditRecord::new("accounting_period", period.id.into_inner(), AuditAction::Close)
        .by(period.closed_by)
        .change(FieldChange::created("start_date", period.start_date))
        .change(FieldChange::created("end_date", period.end_date))
        .change(FieldChange::created("total_revenue", period.total_revenue))
        .change(FieldChange::created("total_expense", period.total_expense))
        .change(FieldChange::created("net_income", period.net_income))
        .change(FieldChange::created("is_closed", period.is_closed))
        .change(FieldChange::created("is_locked", period.is_locked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neraca_core::ledger::LedgerError;

    #[test]
    fn test_rule_errors_name_their_step() {
        let missing: PeriodClosingError = ClosingError::RetainedEarningsMissing("3201".into()).into();
        assert_eq!(missing.step(), ClosingStep::LockRetainedEarnings);
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredAccount);
        assert_eq!(
            missing.to_string(),
            "Period closing failed at step 'lock retained earnings': \
             Retained earnings account 3201 not found"
        );

        let overlap: PeriodClosingError = ClosingError::PeriodOverlap {
            start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            closed_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            closed_end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
        .into();
        assert_eq!(overlap.step(), ClosingStep::CheckPeriodOverlap);
        assert_eq!(overlap.kind(), ErrorKind::Conflict);

        let invalid: PeriodClosingError =
            ClosingError::InvalidEntry(LedgerError::InsufficientLines).into();
        assert_eq!(invalid.step(), ClosingStep::PostClosingEntry);
    }

    #[test]
    fn test_storage_errors_carry_step_context() {
        let result: Result<(), DbErr> = Err(DbErr::Custom("deadlock detected".into()));
        let err = result.at(ClosingStep::LoadTemporaryAccounts).unwrap_err();
        assert_eq!(err.step(), ClosingStep::LoadTemporaryAccounts);
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert!(err.to_string().contains("load temporary accounts"));
    }

    #[test]
    fn test_closing_audit_fields() {
        let period = AccountingPeriod {
            id: PeriodId::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            description: String::new(),
            is_closed: true,
            is_locked: true,
            closed_by: None,
            closed_at: None,
            total_revenue: rust_decimal::Decimal::new(1000, 0),
            total_expense: rust_decimal::Decimal::new(400, 0),
            net_income: rust_decimal::Decimal::new(600, 0),
            closing_entry_id: None,
        };
        let record = closing_audit(&period);
        assert_eq!(record.action, AuditAction::Close);
        assert!(
            record
                .changes
                .iter()
                .any(|c| c.field == "net_income" && c.new_value.as_deref() == Some("600"))
        );
        assert!(
            record
                .changes
                .iter()
                .any(|c| c.field == "is_locked" && c.new_value.as_deref() == Some("true"))
        );
    }
}
