//! Balance sync worker for Neraca.
//!
//! Rebuilds every stored account balance from posted journal lines, then
//! re-checks the result. Runs on a fixed interval, or once when
//! `NERACA__SYNC__RUN_ONCE=true`.
//!
//! Usage: cargo run --bin balance-sync

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neraca_db::{BalanceSyncRepository, TracingAuditSink, connect_with};
use neraca_shared::AppConfig;

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

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    let repo = BalanceSyncRepository::new(db, Arc::new(TracingAuditSink));

    if config.sync.run_once {
        return run_sync(&repo).await;
    }

    let period = Duration::from_secs(config.sync.interval_minutes.max(1) * 60);
    info!(interval_minutes = config.sync.interval_minutes, "Balance sync worker started");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed run is retried on the next tick.
                if let Err(e) = run_sync(&repo).await {
                    error!(error = %e, "Balance sync run failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping balance sync worker");
                return Ok(());
            }
        }
    }
}

/// One sync run followed by an integrity check.
async fn run_sync(repo: &BalanceSyncRepository) -> Result<()> {
    let report = repo
        .sync_account_balances()
        .await
        .context("Balance sync failed")?;
    info!(
        accounts_checked = report.accounts_checked,
        leaf_updates = report.leaf_updates,
        header_updates = report.header_updates,
        clean = report.is_clean(),
        "Balance sync completed"
    );

    let discrepancies = repo
        .verify_balance_integrity()
        .await
        .context("Balance integrity check failed")?;
    for d in &discrepancies {
        warn!(
            account_code = %d.code,
            stored = %d.stored,
            computed = %d.computed,
            difference = %d.difference,
            "Stored balance still disagrees with journal"
        );
    }
    Ok(())
}
