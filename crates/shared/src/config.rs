//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Settings cache configuration.
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Balance sync worker configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Code of the retained earnings account that closing transfers into.
    #[serde(default = "default_retained_earnings_code")]
    pub retained_earnings_code: String,
    /// Base currency of every amount in the ledger.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retained_earnings_code: default_retained_earnings_code(),
            currency: default_currency(),
        }
    }
}

fn default_retained_earnings_code() -> String {
    "3201".to_string()
}

fn default_currency() -> String {
    "IDR".to_string()
}

/// Settings snapshot cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// Time-to-live of the cached settings snapshot in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

/// Balance sync worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Minutes between two sync runs.
    #[serde(default = "default_sync_interval")]
    pub interval_minutes: u64,
    /// Run a single sync and exit.
    #[serde(default)]
    pub run_once: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_sync_interval(),
            run_once: false,
        }
    }
}

fn default_sync_interval() -> u64 {
    60
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("NERACA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
