//! Stored balance maintenance.
//!
//! The running `accounts.balance` column is a cache of the journal. This
//! repository rebuilds it from posted lines and reports drift without fixing it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::{info, warn};

use neraca_core::audit::{AuditAction, AuditRecord, AuditSink, FieldChange};
use neraca_core::ledger::{Account, rollup_header_balances};
use neraca_shared::ErrorKind;
use neraca_shared::types::{AccountId, within_tolerance};

use crate::entities::accounts;
use crate::error::{DbResultExt, StorageFailure};
use crate::repositories::ledger::{LineWindow, journal_totals};

/// Error types for balance maintenance.
#[derive(Debug, thiserror::Error)]
pub enum BalanceSyncError {
    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] StorageFailure),
}

impl BalanceSyncError {
    /// Maps this error onto the shared taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(e) => e.kind(),
        }
    }
}

/// A stored balance that disagrees with the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDiscrepancy {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Value in `accounts.balance`.
    pub stored: Decimal,
    /// Value recomputed from posted lines.
    pub computed: Decimal,
    /// `computed - stored`.
    pub difference: Decimal,
}

/// Outcome of a balance synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Accounts inspected.
    pub accounts_checked: usize,
    /// Leaf accounts whose balance was rewritten.
    pub leaf_updates: usize,
    /// Header accounts whose balance was rewritten.
    pub header_updates: usize,
    /// Every rewritten balance.
    pub corrections: Vec<BalanceDiscrepancy>,
}

impl SyncReport {
    /// Returns true if nothing had to change.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Balance synchronization repository.
#[derive(Clone)]
pub struct BalanceSyncRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl BalanceSyncRepository {
    /// Creates a new balance synchronization repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Rewrites every stored balance from posted journal lines.
    ///
    /// Leaf accounts without lines keep their stored balance. Header accounts
    /// become the sum of their children. All accounts stay locked until the
    /// rewrite commits.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails. Nothing is written in that case.
    pub async fn sync_account_balances(&self) -> Result<SyncReport, BalanceSyncError> {
        let txn = self.db.begin().await.context("begin balance sync")?;

        let mut accounts: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await
            .context("lock accounts for balance sync")?
            .into_iter()
            .map(Account::from)
            .collect();
        let totals = journal_totals(&txn, &LineWindow::default(), &[])
            .await
            .context("aggregate journal lines for balance sync")?;

        let mut report = SyncReport {
            accounts_checked: accounts.len(),
            ..SyncReport::default()
        };
        let original: HashMap<AccountId, Decimal> =
            accounts.iter().map(|a| (a.id, a.balance)).collect();

        for account in accounts.iter_mut().filter(|a| !a.is_header) {
            if let Some((debit, credit)) = totals.get(&account.id.into_inner()) {
                account.balance = account.normal_balance().balance_change(*debit, *credit);
            }
        }
        let headers = rollup_header_balances(&accounts);
        for account in accounts.iter_mut().filter(|a| a.is_header) {
            if let Some(balance) = headers.get(&account.id) {
                account.balance = *balance;
            }
        }

        let now: DateTime<FixedOffset> = Utc::now().into();
        for account in &accounts {
            let stored = original.get(&account.id).copied().unwrap_or_default();
            if stored == account.balance {
                continue;
            }
            accounts::Entity::update_many()
                .col_expr(accounts::Column::Balance, Expr::value(account.balance))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                .filter(accounts::Column::Id.eq(account.id.into_inner()))
                .exec(&txn)
                .await
                .context("rewrite account balance")?;

            if account.is_header {
                report.header_updates += 1;
            } else {
                report.leaf_updates += 1;
            }
            report.corrections.push(discrepancy(account, stored));
        }

        txn.commit().await.context("commit balance sync")?;

        self.audit
            .record_all(report.corrections.iter().map(sync_audit).collect());
        info!(
            checked = report.accounts_checked,
            leaf_updates = report.leaf_updates,
            header_updates = report.header_updates,
            "Synchronized account balances"
        );
        Ok(report)
    }

    /// Compares stored leaf balances with the journal without changing anything.
    ///
    /// Only accounts with posted lines are compared; differences within the
    /// tolerance are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn verify_balance_integrity(
        &self,
    ) -> Result<Vec<BalanceDiscrepancy>, BalanceSyncError> {
        let accounts: Vec<Account> = accounts::Entity::find()
            .filter(accounts::Column::DeletedAt.is_null())
            .filter(accounts::Column::IsHeader.eq(false))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .context("load accounts for integrity check")?
            .into_iter()
            .map(Account::from)
            .collect();
        let totals = journal_totals(&self.db, &LineWindow::default(), &[])
            .await
            .context("aggregate journal lines for integrity check")?;

        let discrepancies: Vec<BalanceDiscrepancy> = accounts
            .iter()
            .filter_map(|account| {
                let (debit, credit) = totals.get(&account.id.into_inner())?;
                let computed = account.normal_balance().balance_change(*debit, *credit);
                if within_tolerance(computed, account.balance) {
                    return None;
                }
                let mut recomputed = account.clone();
                recomputed.balance = computed;
                Some(discrepancy(&recomputed, account.balance))
            })
            .collect();

        if !discrepancies.is_empty() {
            warn!(
                count = discrepancies.len(),
                "Stored balances disagree with the journal"
            );
        }
        Ok(discrepancies)
    }
}

impl std::fmt::Debug for BalanceSyncRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceSyncRepository").finish_non_exhaustive()
    }
}

fn discrepancy(account: &Account, stored: Decimal) -> BalanceDiscrepancy {
    BalanceDiscrepancy {
        account_id: account.id,
        code: account.code.clone(),
        name: account.name.clone(),
        stored,
        computed: account.balance,
        difference: account.balance - stored,
    }
}

fn sync_audit(correction: &BalanceDiscrepancy) -> AuditRecord {
    AuditRecord::new(
        "account",
        correction.account_id.into_inner(),
        AuditAction::Update,
    )
    .change(FieldChange::new(
        "balance",
        correction.stored,
        correction.computed,
    ))
}
