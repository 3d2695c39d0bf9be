//! Storage error wrapping.
//!
//! Every database error that leaves a repository names the operation that
//! failed, so a `StorageFailure` reads like "load temporary accounts: ...".

use sea_orm::DbErr;
use thiserror::Error;

use neraca_shared::ErrorKind;

/// A database error with the operation that produced it.
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct StorageFailure {
    /// Operation that failed.
    pub context: &'static str,
    /// Underlying database error.
    #[source]
    pub source: DbErr,
}

impl StorageFailure {
    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::StorageFailure
    }
}

/// Attaches an operation name to a database result.
pub trait DbResultExt<T> {
    /// Wraps the error as a [`StorageFailure`] naming `context`.
    fn context(self, context: &'static str) -> Result<T, StorageFailure>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn context(self, context: &'static str) -> Result<T, StorageFailure> {
        self.map_err(|source| StorageFailure { context, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_prefixed() {
        let result: Result<(), DbErr> = Err(DbErr::Custom("connection reset".to_string()));
        let err = result.context("load accounts").unwrap_err();
        assert_eq!(err.context, "load accounts");
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert!(err.to_string().starts_with("load accounts: "));
        assert!(err.kind().is_retryable());
    }
}
