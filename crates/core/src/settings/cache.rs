//! Time-boxed settings snapshot cache using Moka.
//!
//! Holds a single [`Settings`] snapshot shared by every read path. The
//! snapshot is populated on first read, dropped on any write through
//! [`SettingsCache::invalidate`], and expires unconditionally after the TTL,
//! so readers must tolerate data up to one TTL old.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::Settings;

/// Default time-to-live for the snapshot (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Cache for the settings snapshot. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<(), Arc<Settings>>,
}

impl SettingsCache {
    /// Creates a cache with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// Creates a cache with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { cache }
    }

    /// Returns the cached snapshot, if present and not expired.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Settings>> {
        self.cache.get(&())
    }

    /// Stores a fresh snapshot and returns the shared handle.
    pub fn insert(&self, settings: Settings) -> Arc<Settings> {
        let snapshot = Arc::new(settings);
        self.cache.insert((), Arc::clone(&snapshot));
        snapshot
    }

    /// Drops the snapshot. Called after any committed write to settings or
    /// to the sequence counters they own.
    pub fn invalidate(&self) {
        self.cache.invalidate(&());
    }

    /// Runs pending maintenance so expirations are observable immediately.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SettingsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsCache")
            .field("populated", &self.cache.contains_key(&()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::FiscalYearStart;

    fn snapshot(start: &str) -> Settings {
        Settings {
            fiscal_year_start: FiscalYearStart::parse(start),
            ..Settings::default()
        }
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = SettingsCache::new();
        assert!(cache.get().is_none());

        cache.insert(snapshot("April 1"));
        let cached = cache.get().unwrap();
        assert_eq!(cached.fiscal_year_start.month(), 4);
    }

    #[test]
    fn test_insert_replaces_snapshot() {
        let cache = SettingsCache::new();
        cache.insert(snapshot("April 1"));
        cache.insert(snapshot("July 1"));
        assert_eq!(cache.get().unwrap().fiscal_year_start.month(), 7);
    }

    #[test]
    fn test_invalidate() {
        let cache = SettingsCache::new();
        cache.insert(snapshot("April 1"));
        cache.invalidate();
        cache.run_pending_tasks();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = SettingsCache::new();
        let other = cache.clone();
        cache.insert(snapshot("April 1"));
        assert!(other.get().is_some());
        other.invalidate();
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = SettingsCache::with_ttl(Duration::from_millis(20));
        cache.insert(snapshot("April 1"));
        std::thread::sleep(Duration::from_millis(60));
        cache.run_pending_tasks();
        assert!(cache.get().is_none());
    }
}
