//! Cross-cutting error taxonomy.
//!
//! Every domain and storage error in the workspace maps onto one [`ErrorKind`],
//! so callers can decide how to surface or retry a failure without matching on
//! crate-specific variants.

use serde::Serialize;

/// Classification shared by all error types in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed date input. Not retried, surfaced to the caller.
    InvalidDate,
    /// Other malformed input (bad range, bad line shape).
    InvalidInput,
    /// A required account (e.g. retained earnings) is absent. Fatal for the operation.
    MissingRequiredAccount,
    /// Query or transaction failure. The whole operation may be retried.
    StorageFailure,
    /// A constructed journal entry does not balance. Never posted.
    UnbalancedEntry,
    /// The operation conflicts with existing state (closed or overlapping period).
    Conflict,
    /// A referenced record does not exist.
    NotFound,
}

impl ErrorKind {
    /// Returns the stable error code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidDate => "INVALID_DATE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingRequiredAccount => "MISSING_REQUIRED_ACCOUNT",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::UnbalancedEntry => "UNBALANCED_ENTRY",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
        }
    }

    /// Returns true if retrying the whole operation may succeed.
    ///
    /// Reads are idempotent and writes are transactional, so only storage
    /// faults qualify.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::StorageFailure)
    }

    /// Returns true if the failure indicates a bug rather than bad input.
    #[must_use]
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::UnbalancedEntry)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::InvalidDate, "INVALID_DATE", false)]
    #[case(ErrorKind::InvalidInput, "INVALID_INPUT", false)]
    #[case(ErrorKind::MissingRequiredAccount, "MISSING_REQUIRED_ACCOUNT", false)]
    #[case(ErrorKind::StorageFailure, "STORAGE_FAILURE", true)]
    #[case(ErrorKind::UnbalancedEntry, "UNBALANCED_ENTRY", false)]
    #[case(ErrorKind::Conflict, "CONFLICT", false)]
    #[case(ErrorKind::NotFound, "NOT_FOUND", false)]
    fn test_kind_codes_and_retry(
        #[case] kind: ErrorKind,
        #[case] code: &str,
        #[case] retryable: bool,
    ) {
        assert_eq!(kind.code(), code);
        assert_eq!(kind.to_string(), code);
        assert_eq!(kind.is_retryable(), retryable);
    }

    #[test]
    fn test_only_unbalanced_is_internal() {
        assert!(ErrorKind::UnbalancedEntry.is_internal());
        assert!(!ErrorKind::InvalidDate.is_internal());
        assert!(!ErrorKind::StorageFailure.is_internal());
    }
}
