//! Ledger Query Layer.
//!
//! Aggregates posted journal lines into per-account balances. When the
//! journal has no lines for the requested accounts the older legacy ledger is
//! consulted, and when that is empty too the stored running balances are
//! used. Within a tier, accounts without lines fall back to their stored
//! balance (e.g. manually adjusted equity).
//!
//! Every function is generic over the connection so statements can run them
//! inside one read-only transaction.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use tracing::debug;
use uuid::Uuid;

use neraca_core::classify::{Bucket, classify};
use neraca_core::ledger::{
    Account, AccountBalance, AccountType, BalanceSource, EntrySource, resolve_balance,
};
use neraca_core::reports::next_day;
use neraca_shared::ErrorKind;

use crate::entities::{
    accounts, journal_entries, journal_lines, legacy_journal_entries, legacy_journal_lines,
    sea_orm_active_enums::{JournalSource, JournalStatus, account_types},
};
use crate::error::{DbResultExt, StorageFailure};

/// Error types for ledger queries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerQueryError {
    /// The range is empty.
    #[error("Invalid range: start {start} is not before end {end_exclusive}")]
    InvalidRange {
        /// Inclusive start.
        start: NaiveDate,
        /// Exclusive end.
        end_exclusive: NaiveDate,
    },

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageFailure),
}

impl LedgerQueryError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "INVALID_DATE_RANGE",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. } => ErrorKind::InvalidInput,
            Self::Storage(e) => e.kind(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Balances together with the tier that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedBalances {
    /// Per-account balances, ordered by account code. Zero balances are omitted.
    pub balances: Vec<AccountBalance>,
    /// Which ledger representation was used.
    pub source: BalanceSource,
}

/// Entry-date window applied to line aggregation.
#[derive(Debug, Clone, Default)]
pub struct LineWindow {
    /// Inclusive lower bound.
    pub start: Option<NaiveDate>,
    /// Exclusive upper bound.
    pub end_exclusive: Option<NaiveDate>,
    /// Journal sources left out (the legacy ledger has no sources).
    pub excluded_sources: Vec<EntrySource>,
}

impl LineWindow {
    /// Every line dated on or before `as_of`.
    #[must_use]
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self::before(next_day(as_of))
    }

    /// Every line dated strictly before `date`.
    #[must_use]
    pub fn before(date: NaiveDate) -> Self {
        Self {
            end_exclusive: Some(date),
            ..Self::default()
        }
    }

    /// Lines dated in `[start, end_exclusive)`.
    #[must_use]
    pub fn range(start: NaiveDate, end_exclusive: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end_exclusive: Some(end_exclusive),
            excluded_sources: Vec::new(),
        }
    }

    /// Leaves out entries with the given source.
    #[must_use]
    pub fn excluding(mut self, source: EntrySource) -> Self {
        self.excluded_sources.push(source);
        self
    }
}

/// Debit and credit totals keyed by account.
pub type LineTotals = HashMap<Uuid, (Decimal, Decimal)>;

/// Ledger query repository.
#[derive(Debug, Clone)]
pub struct LedgerQueryRepository {
    db: DatabaseConnection,
}

impl LedgerQueryRepository {
    /// Creates a new ledger query repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Point-in-time balances as of `as_of` (inclusive).
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn aggregate_balances(
        &self,
        as_of: NaiveDate,
        types: &[AccountType],
    ) -> Result<AggregatedBalances, LedgerQueryError> {
        aggregate_balances(&self.db, as_of, types).await
    }

    /// Net changes over `[start, end_exclusive)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is empty or a query fails.
    pub async fn aggregate_range(
        &self,
        start: NaiveDate,
        end_exclusive: NaiveDate,
        types: &[AccountType],
        excluded_sources: &[EntrySource],
    ) -> Result<AggregatedBalances, LedgerQueryError> {
        aggregate_range(&self.db, start, end_exclusive, types, excluded_sources).await
    }

    /// Cash balance from lines dated strictly before `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn cash_balance(&self, date: NaiveDate) -> Result<Decimal, LedgerQueryError> {
        cash_balance_before(&self.db, date).await
    }
}

// ============================================================================
// Query Functions
// ============================================================================

/// Point-in-time balances as of `as_of` (inclusive) for accounts of the given types.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn aggregate_balances<C: ConnectionTrait>(
    db: &C,
    as_of: NaiveDate,
    types: &[AccountType],
) -> Result<AggregatedBalances, LedgerQueryError> {
    balances_in_window(db, &LineWindow::as_of(as_of), types).await
}

/// Net changes over `[start, end_exclusive)` for accounts of the given types.
///
/// Flows cannot be rebuilt from stored balances, so only the journal and
/// legacy tiers are consulted and accounts without lines are left out.
///
/// # Errors
///
/// Returns an error if the range is empty or a query fails.
pub async fn aggregate_range<C: ConnectionTrait>(
    db: &C,
    start: NaiveDate,
    end_exclusive: NaiveDate,
    types: &[AccountType],
    excluded_sources: &[EntrySource],
) -> Result<AggregatedBalances, LedgerQueryError> {
    if start >= end_exclusive {
        return Err(LedgerQueryError::InvalidRange {
            start,
            end_exclusive,
        });
    }

    let mut window = LineWindow::range(start, end_exclusive);
    window.excluded_sources = excluded_sources.to_vec();

    let accounts = load_leaf_accounts(db, types)
        .await
        .context("load accounts for range aggregation")?;
    let ids: Vec<Uuid> = accounts.iter().map(|a| a.id.into_inner()).collect();

    let mut source = BalanceSource::Journal;
    let mut totals = journal_totals(db, &window, &ids)
        .await
        .context("aggregate journal lines for range")?;
    if totals.is_empty() {
        debug!(%start, %end_exclusive, "journal range empty, falling back to legacy ledger");
        totals = legacy_totals(db, &window, &ids)
            .await
            .context("aggregate legacy lines for range")?;
        if !totals.is_empty() {
            source = BalanceSource::Legacy;
        }
    }

    let balances = accounts
        .iter()
        .filter_map(|account| {
            let (debit, credit) = totals.get(&account.id.into_inner())?;
            let balance = AccountBalance::from_totals(
                account.id,
                account.code.clone(),
                account.name.clone(),
                account.account_type,
                *debit,
                *credit,
            );
            (!balance.is_zero()).then_some(balance)
        })
        .collect();

    Ok(AggregatedBalances { balances, source })
}

/// Cash on hand and in banks from lines dated strictly before `date`.
///
/// Built from line totals only: journal lines, or legacy lines when the
/// journal has none for cash accounts. Stored balances are never consulted,
/// since they reflect the end of the ledger rather than `date`. Accounts
/// without lines contribute zero.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn cash_balance_before<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<Decimal, LedgerQueryError> {
    let cash_accounts: Vec<Account> = load_leaf_accounts(db, &[AccountType::Asset])
        .await
        .context("load cash accounts")?
        .into_iter()
        .filter(|a| classify(&a.code, &a.name, a.account_type).bucket == Bucket::Cash)
        .collect();
    if cash_accounts.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let ids: Vec<Uuid> = cash_accounts.iter().map(|a| a.id.into_inner()).collect();

    let window = LineWindow::before(date);
    let mut totals = journal_totals(db, &window, &ids)
        .await
        .context("aggregate journal lines for cash balance")?;
    if totals.is_empty() {
        debug!(%date, "no journal cash lines, falling back to legacy ledger");
        totals = legacy_totals(db, &window, &ids)
            .await
            .context("aggregate legacy lines for cash balance")?;
    }

    Ok(cash_accounts
        .iter()
        .filter_map(|a| totals.get(&a.id.into_inner()))
        .map(|(debit, credit)| debit - credit)
        .sum())
}

async fn balances_in_window<C: ConnectionTrait>(
    db: &C,
    window: &LineWindow,
    types: &[AccountType],
) -> Result<AggregatedBalances, LedgerQueryError> {
    let accounts = load_leaf_accounts(db, types)
        .await
        .context("load accounts for balance aggregation")?;
    let ids: Vec<Uuid> = accounts.iter().map(|a| a.id.into_inner()).collect();

    let (source, totals) = tiered_totals(db, window, &ids).await?;
    let balances = accounts
        .iter()
        .filter_map(|account| resolve_balance(account, totals.get(&account.id.into_inner()).copied()))
        .collect();

    Ok(AggregatedBalances { balances, source })
}

/// Walks the fallback chain and returns the first tier that has lines.
async fn tiered_totals<C: ConnectionTrait>(
    db: &C,
    window: &LineWindow,
    ids: &[Uuid],
) -> Result<(BalanceSource, LineTotals), LedgerQueryError> {
    let journal = journal_totals(db, window, ids)
        .await
        .context("aggregate journal lines")?;
    if !journal.is_empty() {
        return Ok((BalanceSource::Journal, journal));
    }

    debug!("journal aggregation empty, falling back to legacy ledger");
    let legacy = legacy_totals(db, window, ids)
        .await
        .context("aggregate legacy lines")?;
    if !legacy.is_empty() {
        return Ok((BalanceSource::Legacy, legacy));
    }

    debug!("legacy ledger empty, falling back to stored account balances");
    Ok((BalanceSource::StoredBalance, LineTotals::new()))
}

// ============================================================================
// Raw Queries
// ============================================================================

/// Loads postable accounts: non-header, active, not deleted, ordered by code.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn load_leaf_accounts<C: ConnectionTrait>(
    db: &C,
    types: &[AccountType],
) -> Result<Vec<Account>, DbErr> {
    let accounts = accounts::Entity::find()
        .filter(accounts::Column::AccountType.is_in(account_types(types)))
        .filter(accounts::Column::IsHeader.eq(false))
        .filter(accounts::Column::IsActive.eq(true))
        .filter(accounts::Column::DeletedAt.is_null())
        .order_by_asc(accounts::Column::Code)
        .all(db)
        .await?;

    Ok(accounts.into_iter().map(Account::from).collect())
}

/// Sums posted journal lines per account within the window.
///
/// An empty `ids` slice means every account.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn journal_totals<C: ConnectionTrait>(
    db: &C,
    window: &LineWindow,
    ids: &[Uuid],
) -> Result<LineTotals, DbErr> {
    let mut query = journal_lines::Entity::find()
        .join(JoinType::InnerJoin, journal_lines::Relation::JournalEntries.def())
        .filter(journal_entries::Column::Status.eq(JournalStatus::Posted))
        .filter(journal_entries::Column::DeletedAt.is_null());

    if let Some(start) = window.start {
        query = query.filter(journal_entries::Column::EntryDate.gte(start));
    }
    if let Some(end) = window.end_exclusive {
        query = query.filter(journal_entries::Column::EntryDate.lt(end));
    }
    if !window.excluded_sources.is_empty() {
        let excluded: Vec<JournalSource> = window
            .excluded_sources
            .iter()
            .copied()
            .map(JournalSource::from)
            .collect();
        query = query.filter(journal_entries::Column::Source.is_not_in(excluded));
    }
    if !ids.is_empty() {
        query = query.filter(journal_lines::Column::AccountId.is_in(ids.to_vec()));
    }

    let rows: Vec<(Uuid, Option<Decimal>, Option<Decimal>)> = query
        .select_only()
        .column(journal_lines::Column::AccountId)
        .column_as(
            Expr::col((journal_lines::Entity, journal_lines::Column::DebitAmount)).sum(),
            "debit_total",
        )
        .column_as(
            Expr::col((journal_lines::Entity, journal_lines::Column::CreditAmount)).sum(),
            "credit_total",
        )
        .group_by(journal_lines::Column::AccountId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(collect_totals(rows))
}

/// Sums posted legacy lines per account within the window.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn legacy_totals<C: ConnectionTrait>(
    db: &C,
    window: &LineWindow,
    ids: &[Uuid],
) -> Result<LineTotals, DbErr> {
    let mut query = legacy_journal_lines::Entity::find()
        .join(
            JoinType::InnerJoin,
            legacy_journal_lines::Relation::LegacyJournalEntries.def(),
        )
        .filter(legacy_journal_entries::Column::Status.eq(JournalStatus::Posted))
        .filter(legacy_journal_entries::Column::DeletedAt.is_null());

    if let Some(start) = window.start {
        query = query.filter(legacy_journal_entries::Column::EntryDate.gte(start));
    }
    if let Some(end) = window.end_exclusive {
        query = query.filter(legacy_journal_entries::Column::EntryDate.lt(end));
    }
    if !ids.is_empty() {
        query = query.filter(legacy_journal_lines::Column::AccountId.is_in(ids.to_vec()));
    }

    let rows: Vec<(Uuid, Option<Decimal>, Option<Decimal>)> = query
        .select_only()
        .column(legacy_journal_lines::Column::AccountId)
        .column_as(
            Expr::col((
                legacy_journal_lines::Entity,
                legacy_journal_lines::Column::DebitAmount,
            ))
            .sum(),
            "debit_total",
        )
        .column_as(
            Expr::col((
                legacy_journal_lines::Entity,
                legacy_journal_lines::Column::CreditAmount,
            ))
            .sum(),
            "credit_total",
        )
        .group_by(legacy_journal_lines::Column::AccountId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(collect_totals(rows))
}

fn collect_totals(rows: Vec<(Uuid, Option<Decimal>, Option<Decimal>)>) -> LineTotals {
    rows.into_iter()
        .map(|(account_id, debit, credit)| {
            (
                account_id,
                (debit.unwrap_or_default(), credit.unwrap_or_default()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_as_of_window_includes_the_day() {
        let window = LineWindow::as_of(date(2024, 12, 31));
        assert_eq!(window.start, None);
        assert_eq!(window.end_exclusive, Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_range_window_excluding_closing() {
        let window =
            LineWindow::range(date(2024, 1, 1), date(2025, 1, 1)).excluding(EntrySource::Closing);
        assert_eq!(window.start, Some(date(2024, 1, 1)));
        assert_eq!(window.excluded_sources, vec![EntrySource::Closing]);
    }

    #[test]
    fn test_collect_totals_defaults_missing_sums() {
        let id = Uuid::now_v7();
        let totals = collect_totals(vec![(id, Some(Decimal::new(500, 0)), None)]);
        assert_eq!(totals.get(&id), Some(&(Decimal::new(500, 0), Decimal::ZERO)));
    }

    #[test]
    fn test_invalid_range_kind() {
        let err = LedgerQueryError::InvalidRange {
            start: date(2024, 2, 1),
            end_exclusive: date(2024, 2, 1),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }
}
