//! Journal posting repository.
//!
//! Posting validates a draft, numbers it, writes the entry and its lines and
//! moves the running balance of every touched account, all in one
//! transaction. Touched accounts are locked in id order so concurrent postings
//! cannot deadlock on each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use neraca_core::audit::{AuditAction, AuditRecord, AuditSink, FieldChange};
use neraca_core::fiscal::AccountingPeriod;
use neraca_core::ledger::{
    Account, EntryStatus, EntryTotals, JournalEntryDraft, LedgerError, validate_entry,
};
use neraca_core::sequence::DocumentType;
use neraca_core::settings::SettingsCache;
use neraca_shared::ErrorKind;
use neraca_shared::types::{AccountId, JournalEntryId, UserId};

use crate::entities::{
    accounting_periods, accounts, journal_entries, journal_lines,
    sea_orm_active_enums::{JournalSource, JournalStatus},
};
use crate::error::{DbResultExt, StorageFailure};
use crate::repositories::sequence::{SequenceError, next_number_in};

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// The draft breaks a ledger rule.
    #[error(transparent)]
    Invalid(#[from] LedgerError),

    /// The entry date falls inside a closed period.
    #[error("Cannot post on {date}: period {period_start} to {period_end} is closed")]
    PeriodClosed {
        /// Entry date.
        date: NaiveDate,
        /// Start of the closed period.
        period_start: NaiveDate,
        /// End of the closed period.
        period_end: NaiveDate,
    },

    /// The entry number could not be issued.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageFailure),
}

impl PostingError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(e) => e.error_code(),
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::Sequence(e) => e.error_code(),
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(e) => e.kind(),
            Self::PeriodClosed { .. } => ErrorKind::Conflict,
            Self::Sequence(e) => e.kind(),
            Self::Storage(e) => e.kind(),
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Running balance movement of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Balance before posting.
    pub old_balance: Decimal,
    /// Balance after posting.
    pub new_balance: Decimal,
}

/// A journal entry that has been written and posted.
#[derive(Debug, Clone)]
pub struct PostedEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Issued entry number, e.g. `JE-00042`.
    pub entry_number: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Debit and credit totals.
    pub totals: EntryTotals,
    /// Balance movement per touched account, ordered by account id.
    pub balance_changes: Vec<BalanceChange>,
    /// Audit records to emit once the surrounding transaction commits.
    pub audit: Vec<AuditRecord>,
}

/// Posting repository.
#[derive(Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
    settings: SettingsCache,
    audit: Arc<dyn AuditSink>,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: SettingsCache, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            settings,
            audit,
        }
    }

    /// Validates, numbers and posts a journal entry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The draft breaks a ledger rule
    /// - An account is missing, inactive or a header
    /// - The entry date falls in a closed period
    /// - Database operation fails
    pub async fn post_entry(
        &self,
        draft: &JournalEntryDraft,
        actor: Option<UserId>,
    ) -> Result<PostedEntry, PostingError> {
        let txn = self.db.begin().await.context("begin posting transaction")?;
        let posted = post_entry_in(&txn, draft, actor).await?;
        txn.commit().await.context("commit posting transaction")?;

        self.settings.invalidate();
        self.audit.record_all(posted.audit.clone());

        info!(
            entry_number = %posted.entry_number,
            entry_date = %posted.entry_date,
            total = %posted.totals.total_debit,
            "Posted journal entry"
        );
        Ok(posted)
    }
}

impl std::fmt::Debug for PostingRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostingRepository").finish_non_exhaustive()
    }
}

// ============================================================================
// Transactional Steps
// ============================================================================

/// Posts a journal entry inside the caller's transaction.
///
/// Nothing is visible to other connections until the caller commits. The
/// returned audit records must only be emitted after that commit.
///
/// # Errors
///
/// See [`PostingRepository::post_entry`].
pub async fn post_entry_in<C: ConnectionTrait>(
    txn: &C,
    draft: &JournalEntryDraft,
    actor: Option<UserId>,
) -> Result<PostedEntry, PostingError> {
    let totals = validate_entry(draft)?;

    if let Some(period) = closed_period_containing(txn, draft.entry_date)
        .await
        .context("check closed periods")?
    {
        return Err(PostingError::PeriodClosed {
            date: draft.entry_date,
            period_start: period.start_date,
            period_end: period.end_date,
        });
    }

    // Net movement per account in its normal orientation, keyed in lock order.
    let mut deltas: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for line in &draft.lines {
        deltas.entry(line.account_id.into_inner()).or_default();
    }
    let locked = lock_accounts(txn, deltas.keys().copied().collect())
        .await
        .context("lock posting accounts")?;
    for line in &draft.lines {
        let account = locked
            .get(&line.account_id.into_inner())
            .ok_or(LedgerError::AccountNotFound(line.account_id.into_inner()))?;
        if account.is_header {
            return Err(LedgerError::HeaderAccount(account.code.clone()).into());
        }
        if !account.is_active {
            return Err(LedgerError::AccountInactive(account.code.clone()).into());
        }
        if let Some(delta) = deltas.get_mut(&line.account_id.into_inner()) {
            *delta += account.normal_balance().balance_change(line.debit, line.credit);
        }
    }

    let entry_number = next_number_in(txn, DocumentType::Journal).await?;

    let now: DateTime<FixedOffset> = Utc::now().into();
    let entry_id = JournalEntryId::new();
    journal_entries::ActiveModel {
        id: Set(entry_id.into_inner()),
        entry_number: Set(entry_number.clone()),
        entry_date: Set(draft.entry_date),
        description: Set(draft.description.clone()),
        reference: Set(draft.reference.clone()),
        source: Set(JournalSource::from(draft.source)),
        status: Set(JournalStatus::from(EntryStatus::Posted)),
        total_debit: Set(totals.total_debit),
        total_credit: Set(totals.total_credit),
        is_balanced: Set(true),
        is_auto_generated: Set(draft.is_auto_generated),
        created_by: Set(actor.map(UserId::into_inner)),
        posted_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(txn)
    .await
    .context("insert journal entry")?;

    let lines: Vec<journal_lines::ActiveModel> = draft
        .lines
        .iter()
        .zip(1_i32..)
        .map(|(line, line_number)| journal_lines::ActiveModel {
            id: Set(Uuid::now_v7()),
            journal_entry_id: Set(entry_id.into_inner()),
            account_id: Set(line.account_id.into_inner()),
            line_number: Set(line_number),
            description: Set(line.description.clone()),
            debit_amount: Set(line.debit),
            credit_amount: Set(line.credit),
            created_at: Set(now),
        })
        .collect();
    journal_lines::Entity::insert_many(lines)
        .exec(txn)
        .await
        .context("insert journal lines")?;

    let mut balance_changes = Vec::with_capacity(deltas.len());
    for (account_id, delta) in deltas {
        let Some(account) = locked.get(&account_id) else {
            continue;
        };
        let new_balance = account.balance + delta;
        accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(new_balance))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(account_id))
            .exec(txn)
            .await
            .context("update account balance")?;
        balance_changes.push(BalanceChange {
            account_id: account.id,
            code: account.code.clone(),
            old_balance: account.balance,
            new_balance,
        });
    }

    let audit = posting_audit(entry_id, &entry_number, draft, totals, &balance_changes, actor);

    Ok(PostedEntry {
        id: entry_id,
        entry_number,
        entry_date: draft.entry_date,
        totals,
        balance_changes,
        audit,
    })
}

/// Locks the given accounts `FOR UPDATE` in id order.
async fn lock_accounts<C: ConnectionTrait>(
    txn: &C,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Account>, DbErr> {
    let rows = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(ids))
        .filter(accounts::Column::DeletedAt.is_null())
        .order_by_asc(accounts::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.id, Account::from(row)))
        .collect())
}

/// Finds the closed period that blocks postings dated `date`, if any.
///
/// A period blocks posting only while it is both closed and locked, the same
/// rule as [`AccountingPeriod::blocks_posting_on`].
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn closed_period_containing<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<Option<accounting_periods::Model>, DbErr> {
    let candidates = accounting_periods::Entity::find()
        .filter(accounting_periods::Column::IsClosed.eq(true))
        .filter(accounting_periods::Column::StartDate.lte(date))
        .filter(accounting_periods::Column::EndDate.gte(date))
        .order_by_desc(accounting_periods::Column::EndDate)
        .all(db)
        .await?;

    Ok(candidates
        .into_iter()
        .find(|model| AccountingPeriod::from(model.clone()).blocks_posting_on(date)))
}

fn posting_audit(
    entry_id: JournalEntryId,
    entry_number: &str,
    draft: &JournalEntryDraft,
    totals: EntryTotals,
    balance_changes: &[BalanceChange],
    actor: Option<UserId>,
) -> Vec<AuditRecord> {
    let mut records = Vec::with_capacity(balance_changes.len() + 1);
    records.push(
        AuditRecord::new("journal_entry", entry_id.into_inner(), AuditAction::Post)
            .by(actor)
            .change(FieldChange::created("entry_number", entry_number))
            .change(FieldChange::created("entry_date", draft.entry_date))
            .change(FieldChange::created("source", draft.source))
            .change(FieldChange::created("total_debit", totals.total_debit)),
    );
    records.extend(balance_changes.iter().map(|change| {
        AuditRecord::new("account", change.account_id.into_inner(), AuditAction::Update)
            .by(actor)
            .change(FieldChange::new(
                "balance",
                change.old_balance,
                change.new_balance,
            ))
    }));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use neraca_core::ledger::{EntrySource, JournalLineDraft};
    use rust_decimal_macros::dec;

    #[test]
    fn test_posting_audit_records_entry_then_balances() {
        let cash = AccountId::new();
        let revenue = AccountId::new();
        let draft = JournalEntryDraft::new(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), "Sale")
            .with_line(JournalLineDraft::debit(cash, dec!(150), "Cash"))
            .with_line(JournalLineDraft::credit(revenue, dec!(150), "Sales"))
            .with_source(EntrySource::Manual);
        let changes = vec![BalanceChange {
            account_id: cash,
            code: "1101".into(),
            old_balance: dec!(0),
            new_balance: dec!(150),
        }];

        let records = posting_audit(
            JournalEntryId::new(),
            "JE-00001",
            &draft,
            draft.totals(),
            &changes,
            None,
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entity, "journal_entry");
        assert_eq!(records[0].action, AuditAction::Post);
        assert_eq!(records[1].entity, "account");
        assert_eq!(records[1].changes[0].new_value.as_deref(), Some("150"));
    }

    #[test]
    fn test_period_closed_is_conflict() {
        let err = PostingError::PeriodClosed {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.error_code(), "PERIOD_CLOSED");
    }
}
