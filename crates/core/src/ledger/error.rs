//! Ledger error types for journal entry validation.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use neraca_shared::ErrorKind;

/// Errors that can occur while validating or posting a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line has neither a debit nor a credit amount.
    #[error("Line {line} has no amount")]
    ZeroAmount {
        /// 1-based line number.
        line: usize,
    },

    /// Line amount cannot be negative.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// 1-based line number.
        line: usize,
    },

    /// Line must specify either debit or credit, not both.
    #[error("Line {line} specifies both a debit and a credit")]
    BothSides {
        /// 1-based line number.
        line: usize,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Header accounts only aggregate their children.
    #[error("Account {0} is a header account and cannot be posted to")]
    HeaderAccount(String),
}

impl LedgerError {
    /// Returns the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::BothSides { .. } => "BOTH_SIDES",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::HeaderAccount(_) => "HEADER_ACCOUNT",
        }
    }

    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnbalancedEntry { .. } => ErrorKind::UnbalancedEntry,
            Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::InsufficientLines
            | Self::ZeroAmount { .. }
            | Self::NegativeAmount { .. }
            | Self::BothSides { .. }
            | Self::AccountInactive(_)
            | Self::HeaderAccount(_) => ErrorKind::InvalidInput,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InsufficientLines.error_code(), "INSUFFICIENT_LINES");
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: Decimal::new(100, 2),
                credit: Decimal::new(50, 2),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(LedgerError::BothSides { line: 1 }.error_code(), "BOTH_SIDES");
    }

    #[test]
    fn test_unbalanced_maps_to_internal_kind() {
        let err = LedgerError::UnbalancedEntry {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(5000, 2),
        };
        assert_eq!(err.kind(), ErrorKind::UnbalancedEntry);
        assert!(err.kind().is_internal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedEntry {
            debit: Decimal::new(10000, 2),
            credit: Decimal::new(5000, 2),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced. Debit: 100.00, Credit: 50.00"
        );
        assert_eq!(
            LedgerError::HeaderAccount("1100".to_string()).to_string(),
            "Account 1100 is a header account and cannot be posted to"
        );
    }
}
