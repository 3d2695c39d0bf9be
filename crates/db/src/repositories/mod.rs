//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Functions that must run inside a caller's transaction are free functions
//! generic over `ConnectionTrait`.

pub mod audit;
pub mod balance_sync;
pub mod closing;
pub mod ledger;
pub mod posting;
pub mod sequence;
pub mod settings;
pub mod statement;

pub use audit::TracingAuditSink;
pub use balance_sync::{BalanceDiscrepancy, BalanceSyncError, BalanceSyncRepository, SyncReport};
pub use closing::{
    ClosingResult, ClosingStep, ClosingSummary, PeriodClosingError, PeriodClosingRepository,
};
pub use ledger::{AggregatedBalances, LedgerQueryError, LedgerQueryRepository, LineWindow};
pub use posting::{BalanceChange, PostedEntry, PostingError, PostingRepository};
pub use sequence::{SequenceError, SequenceRepository};
pub use settings::SettingsRepository;
pub use statement::{StatementError, StatementRepository};
