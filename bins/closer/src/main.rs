//! Period closing command for Neraca.
//!
//! Closes revenue and expense balances for an inclusive date range into the
//! retained earnings account named by `ledger.retained_earnings_code`.
//!
//! Usage:
//!   close-period <start> <end> [--preview] [--description <text>]
//!
//! Dates are `YYYY-MM-DD`. `--preview` reports what would be closed without
//! writing anything.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neraca_core::closing::ClosingRequest;
use neraca_core::settings::SettingsCache;
use neraca_db::repositories::ClosingResult;
use neraca_db::{PeriodClosingRepository, TracingAuditSink, connect_with};
use neraca_shared::AppConfig;

/// Parsed command line.
#[derive(Debug, PartialEq, Eq)]
struct Args {
    start: String,
    end: String,
    preview: bool,
    description: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut positional = Vec::new();
    let mut preview = false;
    let mut description = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--preview" => preview = true,
            "--description" => {
                description = Some(args.next().context("--description needs a value")?);
            }
            flag if flag.starts_with("--") => bail!("Unknown option {flag}"),
            _ => positional.push(arg),
        }
    }

    let [start, end]: [String; 2] = positional.try_into().map_err(|_| {
        anyhow::anyhow!("Usage: close-period <start> <end> [--preview] [--description <text>]")
    })?;
    Ok(Args {
        start,
        end,
        preview,
        description,
    })
}

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

    let args = parse_args(std::env::args().skip(1))?;
    let request = ClosingRequest::parse(&args.start, &args.end, args.description, None)?;

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    let closing = PeriodClosingRepository::new(
        db,
        SettingsCache::with_ttl(Duration::from_secs(config.settings.cache_ttl_secs)),
        Arc::new(TracingAuditSink),
        config.ledger.retained_earnings_code.clone(),
    );

    if args.preview {
        let preview = closing.preview(&request).await?;
        println!("Period {} to {}", preview.start, preview.end);
        println!("  Revenue accounts: {}", preview.revenue_accounts.len());
        println!("  Expense accounts: {}", preview.expense_accounts.len());
        println!("  Net income: {}", preview.totals.net_income);
        println!("  Can close: {}", preview.can_close);
        for issue in &preview.issues {
            println!("  - {issue}");
        }
        return Ok(());
    }

    match closing.execute(&request).await? {
        ClosingResult::NothingToClose => println!("Nothing to close"),
        ClosingResult::Closed(summary) => {
            println!(
                "Closed {} to {} with {}",
                summary.period.start_date, summary.period.end_date, summary.entry_number
            );
            println!("  Net income: {}", summary.totals.net_income);
            println!("  Next fiscal year starts: {}", summary.next_fiscal_year_start);
        }
    }
    Ok(())
}
