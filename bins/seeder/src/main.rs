//! Database seeder for Neraca development and testing.
//!
//! Seeds the company profile, an Indonesian demo chart of accounts and a
//! quarter's worth of posted journal entries for the current year.
//! Existing rows are left alone, so the seeder can be run repeatedly.
//!
//! Usage: cargo run --bin seeder

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use neraca_core::ledger::{AccountType, JournalEntryDraft, JournalLineDraft};
use neraca_core::settings::SettingsCache;
use neraca_db::entities::{accounts, company_settings, journal_entries};
use neraca_db::repositories::settings::SETTINGS_ROW_ID;
use neraca_db::{PostingRepository, TracingAuditSink, connect_with};
use neraca_shared::AppConfig;
use neraca_shared::types::AccountId;

/// One row of the demo chart: code, name, type, parent code, header flag.
type ChartRow = (&'static str, &'static str, AccountType, Option<&'static str>, bool);

/// Demo chart of accounts, parents before children.
const CHART: &[ChartRow] = &[
    ("1000", "Aset", AccountType::Asset, None, true),
    ("1100", "Aset Lancar", AccountType::Asset, Some("1000"), true),
    ("1101", "Kas", AccountType::Asset, Some("1100"), false),
    ("1102", "Bank BCA", AccountType::Asset, Some("1100"), false),
    ("1121", "Piutang Usaha", AccountType::Asset, Some("1100"), false),
    ("1131", "Persediaan Barang Dagang", AccountType::Asset, Some("1100"), false),
    ("1141", "Sewa Dibayar di Muka", AccountType::Asset, Some("1100"), false),
    ("1151", "PPN Masukan", AccountType::Asset, Some("1100"), false),
    ("1600", "Aset Tetap", AccountType::Asset, Some("1000"), true),
    ("1601", "Peralatan Kantor", AccountType::Asset, Some("1600"), false),
    ("1602", "Akumulasi Penyusutan Peralatan", AccountType::Asset, Some("1600"), false),
    ("2000", "Liabilitas", AccountType::Liability, None, true),
    ("2101", "Utang Usaha", AccountType::Liability, Some("2000"), false),
    ("2121", "Utang Pajak PPh", AccountType::Liability, Some("2000"), false),
    ("2131", "PPN Keluaran", AccountType::Liability, Some("2000"), false),
    ("2201", "Utang Bank Jangka Panjang", AccountType::Liability, Some("2000"), false),
    ("3000", "Ekuitas", AccountType::Equity, None, true),
    ("3101", "Modal Disetor", AccountType::Equity, Some("3000"), false),
    ("3201", "Laba Ditahan", AccountType::Equity, Some("3000"), false),
    ("3301", "Prive Pemilik", AccountType::Equity, Some("3000"), false),
    ("4000", "Pendapatan", AccountType::Revenue, None, true),
    ("4101", "Pendapatan Penjualan", AccountType::Revenue, Some("4000"), false),
    ("4201", "Pendapatan Jasa", AccountType::Revenue, Some("4000"), false),
    ("5000", "Beban Pokok", AccountType::Expense, None, true),
    ("5101", "Harga Pokok Penjualan", AccountType::Expense, Some("5000"), false),
    ("6000", "Beban Operasional", AccountType::Expense, None, true),
    ("6101", "Beban Gaji", AccountType::Expense, Some("6000"), false),
    ("6102", "Beban Sewa", AccountType::Expense, Some("6000"), false),
    ("6103", "Beban Penyusutan", AccountType::Expense, Some("6000"), false),
];

/// One demo entry: month, day, description, then (code, debit, credit) lines in rupiah.
type DemoEntry = (u32, u32, &'static str, &'static [(&'static str, i64, i64)]);

const ENTRIES: &[DemoEntry] = &[
    (1, 2, "Setoran modal awal", &[("1102", 500_000_000, 0), ("3101", 0, 500_000_000)]),
    (1, 5, "Pembelian peralatan kantor", &[("1601", 60_000_000, 0), ("1102", 0, 60_000_000)]),
    (
        1,
        10,
        "Pembelian persediaan secara kredit",
        &[
            ("1131", 100_000_000, 0),
            ("1151", 11_000_000, 0),
            ("2101", 0, 111_000_000),
        ],
    ),
    (
        2,
        1,
        "Penjualan kredit",
        &[
            ("1121", 166_500_000, 0),
            ("4101", 0, 150_000_000),
            ("2131", 0, 16_500_000),
        ],
    ),
    (2, 1, "Harga pokok penjualan", &[("5101", 90_000_000, 0), ("1131", 0, 90_000_000)]),
    (2, 28, "Penerimaan piutang", &[("1102", 100_000_000, 0), ("1121", 0, 100_000_000)]),
    (3, 1, "Sewa kantor dibayar di muka", &[("1141", 24_000_000, 0), ("1102", 0, 24_000_000)]),
    (3, 31, "Gaji karyawan Maret", &[("6101", 25_000_000, 0), ("1102", 0, 25_000_000)]),
    (3, 31, "Amortisasi sewa", &[("6102", 2_000_000, 0), ("1141", 0, 2_000_000)]),
    (3, 31, "Penyusutan peralatan", &[("6103", 1_000_000, 0), ("1602", 0, 1_000_000)]),
    (4, 10, "Pembayaran utang usaha", &[("2101", 50_000_000, 0), ("1102", 0, 50_000_000)]),
    (4, 15, "Pengisian kas kecil", &[("1101", 5_000_000, 0), ("1102", 0, 5_000_000)]),
    (4, 20, "Pendapatan jasa tunai", &[("1101", 7_500_000, 0), ("4201", 0, 7_500_000)]),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neraca=debug,sea_orm=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding company settings...");
    seed_company_settings(&db, &config.ledger.currency).await?;

    println!("Seeding chart of accounts...");
    let ids = seed_chart_of_accounts(&db).await?;

    println!("Seeding journal entries...");
    let cache = SettingsCache::with_ttl(Duration::from_secs(config.settings.cache_ttl_secs));
    seed_journal_entries(&db, &ids, cache).await?;

    println!("Seeding complete!");
    Ok(())
}

/// Fills in the company profile if it is still blank.
async fn seed_company_settings(db: &DatabaseConnection, currency: &str) -> Result<()> {
    let Some(row) = company_settings::Entity::find_by_id(SETTINGS_ROW_ID)
        .one(db)
        .await?
    else {
        println!("  Settings row missing, run the migrator first");
        return Ok(());
    };
    if !row.company_name.trim().is_empty() {
        println!("  Company profile already set, skipping...");
        return Ok(());
    }

    company_settings::Entity::update_many()
        .col_expr(
            company_settings::Column::CompanyName,
            Expr::value("PT Neraca Contoh"),
        )
        .col_expr(
            company_settings::Column::CompanyAddress,
            Expr::value("Jl. Jend. Sudirman No. 1, Jakarta"),
        )
        .col_expr(company_settings::Column::CompanyPhone, Expr::value("+62 21 555 0100"))
        .col_expr(
            company_settings::Column::CompanyEmail,
            Expr::value("finance@neraca.example"),
        )
        .col_expr(company_settings::Column::Currency, Expr::value(currency))
        .filter(company_settings::Column::Id.eq(SETTINGS_ROW_ID))
        .exec(db)
        .await?;
    println!("  Set company profile: PT Neraca Contoh");
    Ok(())
}

/// Inserts missing chart rows and returns every demo account id by code.
async fn seed_chart_of_accounts(db: &DatabaseConnection) -> Result<HashMap<String, AccountId>> {
    let mut ids: HashMap<String, AccountId> = HashMap::new();
    let mut created = 0_usize;

    for (code, name, account_type, parent, is_header) in CHART {
        if let Some(existing) = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(*code))
            .one(db)
            .await?
        {
            ids.insert((*code).to_string(), AccountId::from_uuid(existing.id));
            continue;
        }

        let parent_id = match parent {
            Some(parent_code) => Some(
                ids.get(*parent_code)
                    .with_context(|| format!("Parent {parent_code} of {code} not seeded"))?
                    .into_inner(),
            ),
            None => None,
        };

        let now: DateTime<FixedOffset> = Utc::now().into();
        let id = Uuid::now_v7();
        accounts::ActiveModel {
            id: Set(id),
            code: Set((*code).to_string()),
            name: Set((*name).to_string()),
            account_type: Set((*account_type).into()),
            parent_id: Set(parent_id),
            is_header: Set(*is_header),
            is_active: Set(true),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(db)
        .await
        .with_context(|| format!("Failed to insert account {code}"))?;

        ids.insert((*code).to_string(), AccountId::from_uuid(id));
        created += 1;
    }

    println!("  Created {created} accounts ({} in chart)", CHART.len());
    Ok(ids)
}

/// Posts the demo entries into the current year unless the journal already has entries.
async fn seed_journal_entries(
    db: &DatabaseConnection,
    ids: &HashMap<String, AccountId>,
    cache: SettingsCache,
) -> Result<()> {
    let existing = journal_entries::Entity::find().count(db).await?;
    if existing > 0 {
        println!("  Journal already has {existing} entries, skipping...");
        return Ok(());
    }

    let posting = PostingRepository::new(db.clone(), cache, Arc::new(TracingAuditSink));
    let year = Utc::now().year();

    for (month, day, description, lines) in ENTRIES {
        let entry_date = NaiveDate::from_ymd_opt(year, *month, *day)
            .with_context(|| format!("Invalid demo date {year}-{month}-{day}"))?;
        let mut draft = JournalEntryDraft::new(entry_date, *description);
        for (code, debit, credit) in *lines {
            let account_id = *ids
                .get(*code)
                .with_context(|| format!("Account {code} not seeded"))?;
            let line = if *debit > 0 {
                JournalLineDraft::debit(account_id, Decimal::from(*debit), *description)
            } else {
                JournalLineDraft::credit(account_id, Decimal::from(*credit), *description)
            };
            draft = draft.with_line(line);
        }

        match posting.post_entry(&draft, None).await {
            Ok(posted) => println!("  Posted {} {}", posted.entry_number, description),
            Err(e) => eprintln!("  Failed to post '{description}': {e}"),
        }
    }
    Ok(())
}
