//! Company settings repository.
//!
//! Reads go through the process-wide [`SettingsCache`]. A missing settings
//! row yields the defaults (January 1, empty profile).

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tracing::debug;

use neraca_core::audit::{AuditAction, AuditRecord, FieldChange};
use neraca_core::fiscal::FiscalYearStart;
use neraca_core::settings::{Settings, SettingsCache};

use crate::entities::company_settings;
use crate::error::{DbResultExt, StorageFailure};

/// Primary key of the single settings row.
pub const SETTINGS_ROW_ID: i32 = 1;

/// Settings repository.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
    cache: SettingsCache,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, cache: SettingsCache) -> Self {
        Self { db, cache }
    }

    /// Returns the current settings snapshot, loading it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings row cannot be read.
    pub async fn get(&self) -> Result<Arc<Settings>, StorageFailure> {
        if let Some(settings) = self.cache.get() {
            return Ok(settings);
        }

        debug!("Settings cache miss, loading company settings");
        let settings = load_settings(&self.db)
            .await
            .context("load company settings")?;
        Ok(self.cache.insert(settings))
    }

    /// Drops the cached snapshot.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// The cache shared with the write paths.
    #[must_use]
    pub fn cache(&self) -> &SettingsCache {
        &self.cache
    }
}

/// Reads the settings row, falling back to defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn load_settings<C: ConnectionTrait>(db: &C) -> Result<Settings, DbErr> {
    Ok(company_settings::Entity::find_by_id(SETTINGS_ROW_ID)
        .one(db)
        .await?
        .map(Settings::from)
        .unwrap_or_default())
}

/// Stores a new fiscal year start inside the caller's transaction.
///
/// Returns the audit record for the change, or `None` if the value was
/// already current or the settings row does not exist.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn set_fiscal_year_start<C: ConnectionTrait>(
    db: &C,
    value: FiscalYearStart,
) -> Result<Option<AuditRecord>, DbErr> {
    let Some(current) = company_settings::Entity::find_by_id(SETTINGS_ROW_ID)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let old = FiscalYearStart::parse(&current.fiscal_year_start);
    if old == value {
        return Ok(None);
    }

    let now: DateTime<FixedOffset> = Utc::now().into();
    company_settings::Entity::update_many()
        .col_expr(
            company_settings::Column::FiscalYearStart,
            Expr::value(value.to_string()),
        )
        .col_expr(company_settings::Column::UpdatedAt, Expr::value(now))
        .filter(company_settings::Column::Id.eq(SETTINGS_ROW_ID))
        .exec(db)
        .await?;

    Ok(Some(
        AuditRecord::new("company_settings", SETTINGS_ROW_ID, AuditAction::Update)
            .change(FieldChange::new("fiscal_year_start", old, value)),
    ))
}
