//! Cache configuration and runtime reconfiguration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TTL applied to entries whose `set` call does not override it
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Maximum entry count before LRU eviction kicks in
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Interval between background expiry sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Logical key under which persisted snapshots are stored by default
///
/// Two instances persisting under the same key clobber each other; callers
/// running multiple persistent caches must assign distinct keys.
pub const DEFAULT_SNAPSHOT_KEY: &str = "fleetcache.snapshot";

/// Configuration for a cache instance, fixed at construction and adjustable
/// later through [`CacheManager::update_config`](crate::CacheManager::update_config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for entries set without an explicit override
    pub default_ttl: Duration,

    /// Maximum number of live entries
    pub max_size: usize,

    /// Mirror full state to the snapshot store on every mutation
    pub persist: bool,

    /// Logical key used in the snapshot store when `persist` is on
    pub snapshot_key: String,

    /// How often the background sweep removes expired entries
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_size: DEFAULT_MAX_SIZE,
            persist: false,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maximum entry count
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Enable or disable snapshot persistence
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Set the snapshot store key
    pub fn with_snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = key.into();
        self
    }

    /// Set the background sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Preset for API response caching: short TTL, generous capacity
    pub fn api() -> Self {
        Self::new()
            .with_default_ttl(Duration::from_secs(60))
            .with_max_size(500)
            .with_snapshot_key("fleetcache.api")
    }

    /// Preset for general application state: the stock defaults
    pub fn general() -> Self {
        Self::new().with_snapshot_key("fleetcache.general")
    }

    /// Preset for user data: long TTL, small capacity, persisted
    pub fn user_data() -> Self {
        Self::new()
            .with_default_ttl(Duration::from_secs(24 * 60 * 60))
            .with_max_size(200)
            .with_persist(true)
            .with_snapshot_key("fleetcache.user_data")
    }

    /// Merge a partial update into this configuration
    pub fn apply(&mut self, update: CacheConfigUpdate) {
        if let Some(ttl) = update.default_ttl {
            self.default_ttl = ttl;
        }
        if let Some(max_size) = update.max_size {
            self.max_size = max_size;
        }
        if let Some(persist) = update.persist {
            self.persist = persist;
        }
        if let Some(key) = update.snapshot_key {
            self.snapshot_key = key;
        }
        if let Some(interval) = update.sweep_interval {
            self.sweep_interval = interval;
        }
    }
}

/// Partial configuration overlay for runtime reconfiguration
///
/// Unset fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfigUpdate {
    pub default_ttl: Option<Duration>,
    pub max_size: Option<usize>,
    pub persist: Option<bool>,
    pub snapshot_key: Option<String>,
    pub sweep_interval: Option<Duration>,
}

impl CacheConfigUpdate {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Override the maximum entry count
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Override the persistence flag
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = Some(persist);
        self
    }

    /// Override the snapshot store key
    pub fn with_snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = Some(key.into());
        self
    }

    /// Override the sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.max_size, 1000);
        assert!(!config.persist);
        assert_eq!(config.snapshot_key, DEFAULT_SNAPSHOT_KEY);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_chain() {
        let config = CacheConfig::new()
            .with_default_ttl(Duration::from_secs(10))
            .with_max_size(2)
            .with_persist(true)
            .with_snapshot_key("test.snapshot");

        assert_eq!(config.default_ttl, Duration::from_secs(10));
        assert_eq!(config.max_size, 2);
        assert!(config.persist);
        assert_eq!(config.snapshot_key, "test.snapshot");
    }

    #[test]
    fn test_presets_are_distinct() {
        let api = CacheConfig::api();
        let general = CacheConfig::general();
        let user = CacheConfig::user_data();

        assert!(api.default_ttl < general.default_ttl);
        assert!(general.default_ttl < user.default_ttl);
        assert!(user.persist);
        assert!(!api.persist);

        // Persisting instances must not share a snapshot key.
        assert_ne!(api.snapshot_key, general.snapshot_key);
        assert_ne!(general.snapshot_key, user.snapshot_key);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut config = CacheConfig::default();
        config.apply(
            CacheConfigUpdate::new()
                .with_default_ttl(Duration::from_secs(1))
                .with_max_size(7),
        );

        assert_eq!(config.default_ttl, Duration::from_secs(1));
        assert_eq!(config.max_size, 7);
        // Untouched fields keep their previous values.
        assert!(!config.persist);
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut config = CacheConfig::api();
        let before = config.clone();
        config.apply(CacheConfigUpdate::new());
        assert_eq!(config, before);
    }
}
