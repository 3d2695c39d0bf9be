//! Sequence repository for gap-free document numbers.
//!
//! Each document type has one counter row. Issuing a number locks that row
//! for the rest of the transaction, so concurrent callers queue behind each
//! other and never receive the same number. If the surrounding transaction
//! rolls back, the increment rolls back with it.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use tracing::info;

use neraca_core::sequence::{DocumentType, format_document_number};
use neraca_core::settings::SettingsCache;
use neraca_shared::ErrorKind;

use crate::entities::sequence_counters;
use crate::error::{DbResultExt, StorageFailure};

/// Error types for sequence operations.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    /// The counter row vanished between creation and locking.
    #[error("Sequence counter for {0} not found")]
    CounterMissing(String),

    /// The counter cannot be incremented further.
    #[error("Sequence counter for {0} is exhausted")]
    Exhausted(String),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageFailure),
}

impl SequenceError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CounterMissing(_) => "SEQUENCE_NOT_FOUND",
            Self::Exhausted(_) => "SEQUENCE_EXHAUSTED",
            Self::Storage(_) => "STORAGE_FAILURE",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CounterMissing(_) => ErrorKind::NotFound,
            Self::Exhausted(_) => ErrorKind::Conflict,
            Self::Storage(e) => e.kind(),
        }
    }
}

/// Sequence repository.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
    settings: SettingsCache,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, settings: SettingsCache) -> Self {
        Self { db, settings }
    }

    /// Issues the next number for `document_type` in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be locked or updated.
    pub async fn next_number(&self, document_type: DocumentType) -> Result<String, SequenceError> {
        let txn = self.db.begin().await.context("begin sequence transaction")?;
        let number = next_number_in(&txn, document_type).await?;
        txn.commit().await.context("commit sequence transaction")?;

        // Prefixes live next to the settings, so cached snapshots are stale now.
        self.settings.invalidate();

        info!(document_type = %document_type, number = %number, "Issued document number");
        Ok(number)
    }

    /// Returns the number the next call would issue, without reserving it.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be read.
    pub async fn peek_next_number(
        &self,
        document_type: DocumentType,
    ) -> Result<String, SequenceError> {
        let counter = sequence_counters::Entity::find_by_id(document_type.as_str())
            .one(&self.db)
            .await
            .context("read sequence counter")?;

        Ok(counter.map_or_else(
            || format_document_number(document_type.default_prefix(), 1),
            |c| format_document_number(&c.prefix, c.next_number),
        ))
    }
}

/// Issues the next number for `document_type` inside the caller's transaction.
///
/// A missing counter is created with the default prefix starting at 1. The
/// counter row stays locked until the caller commits or rolls back.
///
/// # Errors
///
/// Returns an error if the counter cannot be locked or updated.
pub async fn next_number_in<C: ConnectionTrait>(
    txn: &C,
    document_type: DocumentType,
) -> Result<String, SequenceError> {
    let key = document_type.as_str();

    let seed = sequence_counters::ActiveModel {
        document_type: Set(key.to_string()),
        prefix: Set(document_type.default_prefix().to_string()),
        next_number: Set(1),
        updated_at: Set(Utc::now().into()),
    };
    sequence_counters::Entity::insert(seed)
        .on_conflict(
            OnConflict::column(sequence_counters::Column::DocumentType)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await
        .context("create sequence counter")?;

    let counter = sequence_counters::Entity::find_by_id(key)
        .lock_exclusive()
        .one(txn)
        .await
        .context("lock sequence counter")?
        .ok_or_else(|| SequenceError::CounterMissing(key.to_string()))?;

    let issued = counter.next_number;
    let following = issued
        .checked_add(1)
        .ok_or_else(|| SequenceError::Exhausted(key.to_string()))?;

    sequence_counters::Entity::update_many()
        .col_expr(sequence_counters::Column::NextNumber, Expr::value(following))
        .col_expr(
            sequence_counters::Column::UpdatedAt,
            Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
        )
        .filter(sequence_counters::Column::DocumentType.eq(key))
        .exec(txn)
        .await
        .context("advance sequence counter")?;

    Ok(format_document_number(&counter.prefix, issued))
}
