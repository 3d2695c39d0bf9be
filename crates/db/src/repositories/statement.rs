//! Financial statement repository.
//!
//! Loads ledger aggregates inside one repeatable-read, read-only transaction
//! so every figure of a statement comes from the same snapshot, then hands
//! them to the pure generators in `neraca_core::reports`.

use chrono::{NaiveDate, Utc};
use sea_orm::{AccessMode, DatabaseConnection, IsolationLevel, TransactionTrait};
use tracing::{info, warn};

use neraca_core::ledger::{AccountType, EntrySource};
use neraca_core::reports::{
    BalanceSheet, BalanceSheetGenerator, BalanceSheetInput, CashFlow, CashFlowGenerator,
    CashFlowInput, ReportError, ReportRange, resolve_as_of, resolve_range,
};
use neraca_core::settings::{SettingsCache, SettingsProvider};
use neraca_shared::ErrorKind;

use crate::error::{DbResultExt, StorageFailure};
use crate::repositories::ledger::{
    LedgerQueryError, aggregate_balances, aggregate_range, cash_balance_before,
};
use crate::repositories::settings::SettingsRepository;

/// Error types for statement generation.
#[derive(Debug, thiserror::Error)]
pub enum StatementError {
    /// Bad date input.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Ledger aggregation failed.
    #[error(transparent)]
    Query(#[from] LedgerQueryError),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageFailure),
}

impl StatementError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Report(e) => e.error_code(),
            Self::Query(e) => e.error_code(),
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Report(e) => e.kind(),
            Self::Query(e) => e.kind(),
            Self::Storage(e) => e.kind(),
        }
    }
}

/// Statement repository.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
    settings: SettingsRepository,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, cache: SettingsCache) -> Self {
        Self {
            settings: SettingsRepository::new(db.clone(), cache),
            db,
        }
    }

    /// Generates the Balance Sheet as of `as_of` (`YYYY-MM-DD`).
    ///
    /// Defaults to the end of the current fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if the date is malformed or a query fails.
    pub async fn balance_sheet(&self, as_of: Option<&str>) -> Result<BalanceSheet, StatementError> {
        let settings = self.settings.get().await?;
        let today = Utc::now().date_naive();
        let as_of = resolve_as_of(as_of, settings.fiscal_year_start(), today)?;
        self.balance_sheet_at(as_of, settings.as_ref()).await
    }

    /// Generates the Balance Sheet for a resolved date and settings provider.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn balance_sheet_at(
        &self,
        as_of: NaiveDate,
        settings: &dyn SettingsProvider,
    ) -> Result<BalanceSheet, StatementError> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .context("begin statement snapshot")?;
        let balances = aggregate_balances(&txn, as_of, &AccountType::BALANCE_SHEET).await?;
        let income = aggregate_balances(&txn, as_of, &AccountType::TEMPORARY).await?;
        txn.commit().await.context("end statement snapshot")?;

        let sheet = BalanceSheetGenerator::generate(BalanceSheetInput {
            as_of,
            balances: balances.balances,
            income: income.balances,
            data_source: balances.source,
            company: settings.company_profile(),
            generated_at: Utc::now(),
        });

        if sheet.is_balanced {
            info!(
                as_of = %as_of,
                total_assets = %sheet.total_assets,
                source = ?sheet.data_source,
                "Generated balance sheet"
            );
        } else {
            warn!(
                as_of = %as_of,
                difference = %sheet.balance_difference,
                "Balance sheet does not balance"
            );
        }
        Ok(sheet)
    }

    /// Generates the Cash Flow statement for `[start, end]` (`YYYY-MM-DD`).
    ///
    /// Each missing bound defaults to the matching bound of the current
    /// fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error if a date is malformed, the range is inverted or a
    /// query fails.
    pub async fn cash_flow(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<CashFlow, StatementError> {
        let settings = self.settings.get().await?;
        let today = Utc::now().date_naive();
        let range = resolve_range(start, end, settings.fiscal_year_start(), today)?;
        self.cash_flow_between(range.start, range.end, settings.as_ref())
            .await
    }

    /// Generates the Cash Flow statement for resolved dates and a settings provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted or a query fails.
    pub async fn cash_flow_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        settings: &dyn SettingsProvider,
    ) -> Result<CashFlow, StatementError> {
        let range = ReportRange::new(start, end)?;
        let end_exclusive = range.end_exclusive();

        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .context("begin statement snapshot")?;
        let changes = aggregate_range(
            &txn,
            range.start,
            end_exclusive,
            &AccountType::ALL,
            &[EntrySource::Closing],
        )
        .await?;
        let cash_at_beginning = cash_balance_before(&txn, range.start).await?;
        let cash_at_end = cash_balance_before(&txn, end_exclusive).await?;
        txn.commit().await.context("end statement snapshot")?;

        let flow = CashFlowGenerator::generate(CashFlowInput {
            start: range.start,
            end: range.end,
            changes: changes.balances,
            cash_at_beginning,
            cash_at_end,
            data_source: changes.source,
            company: settings.company_profile(),
            generated_at: Utc::now(),
        })?;

        if !flow.reconciliation_adjustment.is_zero() {
            warn!(
                start = %range.start,
                end = %range.end,
                adjustment = %flow.reconciliation_adjustment,
                "Cash flow needed a reconciliation adjustment"
            );
        }
        info!(
            start = %range.start,
            end = %range.end,
            net_cash_flow = %flow.net_cash_flow,
            source = ?flow.data_source,
            "Generated cash flow statement"
        );
        Ok(flow)
    }
}
