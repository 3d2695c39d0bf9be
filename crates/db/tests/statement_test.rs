//! Financial statement integration tests.
//!
//! Posts a small set of entries into an otherwise unused fiscal year and
//! checks the Balance Sheet and Cash Flow built from them.

#![allow(clippy::uninlined_format_args)]

mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;

use neraca_core::ledger::{AccountType, BalanceSource, JournalEntryDraft, JournalLineDraft};
use neraca_core::reports::RECONCILIATION_CODE;
use neraca_core::settings::{Settings, SettingsCache};
use neraca_db::repositories::{
    BalanceSyncRepository, LedgerQueryRepository, PostingRepository, StatementError,
    StatementRepository, TracingAuditSink,
};
use neraca_shared::ErrorKind;
use tokio::sync::Mutex;

use common::{create_account, date, random_year, suffix};

// Cash balances span every cash account, so tests that move cash must not
// interleave.
static SERIAL: Mutex<()> = Mutex::const_new(());

#[tokio::test]
async fn test_statements_reflect_posted_entries() {
    let _serial = SERIAL.lock().await;
    let Some(db) = common::connect().await else {
        return;
    };
    let year = random_year();
    let tag = suffix();
    let cache = SettingsCache::new();
    let posting = PostingRepository::new(db.clone(), cache.clone(), Arc::new(TracingAuditSink));

    let cash = create_account(&db, &format!("110{}", tag), "Kas Statement", AccountType::Asset).await;
    let capital =
        create_account(&db, &format!("310{}", tag), "Modal Disetor", AccountType::Equity).await;
    let revenue =
        create_account(&db, &format!("430{}", tag), "Pendapatan Usaha", AccountType::Revenue).await;

    // Opening capital on the last day before the period.
    posting
        .post_entry(
            &JournalEntryDraft::new(date(year - 1, 12, 31), "Paid-in capital")
                .with_line(JournalLineDraft::debit(cash.id, dec!(500), "Cash"))
                .with_line(JournalLineDraft::credit(capital.id, dec!(500), "Capital")),
            None,
        )
        .await
        .expect("Failed to post capital");
    let posted = posting
        .post_entry(
            &JournalEntryDraft::new(date(year, 3, 15), "Cash sale")
                .with_line(JournalLineDraft::debit(cash.id, dec!(1000), "Cash"))
                .with_line(JournalLineDraft::credit(revenue.id, dec!(1000), "Sales")),
            None,
        )
        .await
        .expect("Failed to post sale");
    assert!(posted.totals.is_balanced());
    assert_eq!(posted.balance_changes.len(), 2);

    let statements = StatementRepository::new(db.clone(), cache.clone());
    let settings = Settings::default();

    let sheet = statements
        .balance_sheet_at(date(year, 12, 31), &settings)
        .await
        .expect("Balance sheet failed");
    assert_eq!(sheet.data_source, BalanceSource::Journal);
    let cash_line = sheet
        .assets
        .items()
        .find(|item| item.code == cash.code)
        .expect("Cash line missing");
    assert_eq!(cash_line.amount, dec!(1500));
    assert!(sheet.equity.items().any(|item| item.code == capital.code));

    let flow = statements
        .cash_flow_between(date(year, 1, 1), date(year, 12, 31), &settings)
        .await
        .expect("Cash flow failed");
    assert_eq!(flow.data_source, BalanceSource::Journal);
    assert_eq!(flow.operating.net_income, dec!(1000));
    assert_eq!(flow.cash_at_end - flow.cash_at_beginning, dec!(1000));
    assert_eq!(flow.net_cash_flow, dec!(1000));
    assert_eq!(flow.reconciliation_adjustment, dec!(0));
    assert!(flow.items().all(|item| item.code != RECONCILIATION_CODE));

    let ledger = LedgerQueryRepository::new(db.clone());
    let before_sale = ledger
        .cash_balance(date(year, 3, 15))
        .await
        .expect("Cash balance failed");
    let after_sale = ledger
        .cash_balance(date(year, 3, 16))
        .await
        .expect("Cash balance failed");
    assert_eq!(after_sale - before_sale, dec!(1000));

    let changes = ledger
        .aggregate_range(
            date(year, 1, 1),
            date(year + 1, 1, 1),
            &[AccountType::Revenue],
            &[],
        )
        .await
        .expect("Range aggregation failed");
    let revenue_change = changes
        .balances
        .iter()
        .find(|b| b.account_id == revenue.id)
        .expect("Revenue change missing");
    assert_eq!(revenue_change.net_balance, dec!(1000));
}

#[tokio::test]
async fn test_cash_first_posted_inside_period() {
    let _serial = SERIAL.lock().await;
    let Some(db) = common::connect().await else {
        return;
    };
    let year = random_year();
    let tag = suffix();
    let cache = SettingsCache::new();
    let posting = PostingRepository::new(db.clone(), cache.clone(), Arc::new(TracingAuditSink));
    let ledger = LedgerQueryRepository::new(db.clone());

    let cash = create_account(&db, &format!("110{}", tag), "Kas Baru", AccountType::Asset).await;
    let capital =
        create_account(&db, &format!("310{}", tag), "Modal Baru", AccountType::Equity).await;

    let opening_cash = ledger
        .cash_balance(date(year, 1, 1))
        .await
        .expect("Cash balance failed");

    // The account's only line is inside the period.
    posting
        .post_entry(
            &JournalEntryDraft::new(date(year, 3, 1), "Paid-in capital")
                .with_line(JournalLineDraft::debit(cash.id, dec!(1000), "Cash"))
                .with_line(JournalLineDraft::credit(capital.id, dec!(1000), "Capital")),
            None,
        )
        .await
        .expect("Failed to post capital");

    assert_eq!(
        ledger
            .cash_balance(date(year, 1, 1))
            .await
            .expect("Cash balance failed"),
        opening_cash,
        "A posting inside the period leaked into beginning cash"
    );

    let statements = StatementRepository::new(db.clone(), cache);
    let flow = statements
        .cash_flow_between(date(year, 1, 1), date(year, 12, 31), &Settings::default())
        .await
        .expect("Cash flow failed");
    assert_eq!(flow.cash_at_beginning, opening_cash);
    assert_eq!(flow.cash_at_end - flow.cash_at_beginning, dec!(1000));
    assert_eq!(flow.financing.total, dec!(1000));
    assert_eq!(flow.net_cash_flow, dec!(1000));
    assert_eq!(flow.reconciliation_adjustment, dec!(0));
    assert!(flow.items().all(|item| item.code != RECONCILIATION_CODE));
}

#[tokio::test]
async fn test_malformed_dates_are_rejected() {
    let Some(db) = common::connect().await else {
        return;
    };
    let statements = StatementRepository::new(db, SettingsCache::new());

    let err = statements
        .balance_sheet(Some("31/12/2024"))
        .await
        .expect_err("Malformed date must fail");
    assert!(matches!(err, StatementError::Report(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidDate);

    let err = statements
        .cash_flow(Some("2024-12-31"), Some("2024-01-01"))
        .await
        .expect_err("Inverted range must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
}

#[tokio::test]
async fn test_balance_sync_repairs_drift() {
    let _serial = SERIAL.lock().await;
    let Some(db) = common::connect().await else {
        return;
    };
    let year = random_year();
    let tag = suffix();
    let audit = Arc::new(TracingAuditSink);
    let posting = PostingRepository::new(db.clone(), SettingsCache::new(), audit.clone());

    let cash = create_account(&db, &format!("110{}", tag), "Kas Drift", AccountType::Asset).await;
    let payable =
        create_account(&db, &format!("210{}", tag), "Utang Usaha", AccountType::Liability).await;
    posting
        .post_entry(
            &JournalEntryDraft::new(date(year, 5, 5), "Supplier credit")
                .with_line(JournalLineDraft::debit(cash.id, dec!(300), "Cash"))
                .with_line(JournalLineDraft::credit(payable.id, dec!(300), "Payable")),
            None,
        )
        .await
        .expect("Failed to post");

    // Corrupt the stored balance behind the ledger's back.
    {
        use neraca_db::entities::accounts;
        use sea_orm::sea_query::Expr;
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

        accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(dec!(999)))
            .filter(accounts::Column::Id.eq(cash.id.into_inner()))
            .exec(&db)
            .await
            .expect("Failed to corrupt balance");
    }

    let sync = BalanceSyncRepository::new(db.clone(), audit);
    let drift = sync
        .verify_balance_integrity()
        .await
        .expect("Integrity check failed");
    let found = drift
        .iter()
        .find(|d| d.account_id == cash.id)
        .expect("Drift not detected");
    assert_eq!(found.stored, dec!(999));
    assert_eq!(found.computed, dec!(300));

    let report = sync.sync_account_balances().await.expect("Sync failed");
    assert!(report.corrections.iter().any(|c| c.account_id == cash.id));
    assert_eq!(common::stored_balance(&db, &cash).await, dec!(300));
}
