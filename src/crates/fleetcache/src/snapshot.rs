//! Serialized full-state snapshot for export, import, and persistence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::stats::CacheStats;

/// Current snapshot document format version
pub const SNAPSHOT_VERSION: i32 = 1;

/// Complete serialized state of a cache instance
///
/// Entries are exported raw, technically-expired ones included; filtering
/// against the clock happens on import, not export, so a snapshot ages
/// correctly however long it sits in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot<V> {
    /// Snapshot format version (currently 1)
    pub v: i32,

    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,

    /// Configuration of the exporting instance
    pub config: CacheConfig,

    /// Cumulative statistics at export time
    pub stats: CacheStats,

    /// Raw entries keyed by cache key
    pub entries: HashMap<String, CacheEntry<V>>,
}

impl<V> CacheSnapshot<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Build a snapshot from live state
    pub fn new(
        config: CacheConfig,
        stats: CacheStats,
        entries: HashMap<String, CacheEntry<V>>,
    ) -> Self {
        Self {
            v: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            config,
            stats,
            entries,
        }
    }

    /// Serialize to the JSON wire form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot from its JSON wire form
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Consume the snapshot, keeping only entries still fresh as of `now`
    pub fn live_entries(self, now: DateTime<Utc>) -> HashMap<String, CacheEntry<V>> {
        self.entries
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn sample_stats() -> CacheStats {
        CacheStats {
            hits: 2,
            misses: 1,
            evictions: 0,
            expirations: 0,
            total_entries: 2,
            memory_usage: 128,
            hit_rate: 200.0 / 3.0,
        }
    }

    #[test]
    fn test_round_trip() {
        let mut entries = HashMap::new();
        entries.insert(
            "vehicle_42".to_string(),
            CacheEntry::new("idle".to_string(), Duration::from_secs(60)),
        );

        let snapshot = CacheSnapshot::new(CacheConfig::default(), sample_stats(), entries);
        let json = snapshot.to_json().unwrap();
        let restored: CacheSnapshot<String> = CacheSnapshot::from_json(&json).unwrap();

        assert_eq!(restored.v, SNAPSHOT_VERSION);
        assert_eq!(restored.stats, snapshot.stats);
        assert_eq!(restored.entries.len(), 1);
        assert_eq!(restored.entries["vehicle_42"].value, "idle");
    }

    #[test]
    fn test_live_entries_filters_expired() {
        let mut entries = HashMap::new();
        entries.insert(
            "fresh".to_string(),
            CacheEntry::new(1, Duration::from_secs(3600)),
        );
        entries.insert(
            "stale".to_string(),
            CacheEntry::new(2, Duration::from_millis(1)),
        );

        let snapshot = CacheSnapshot::new(CacheConfig::default(), sample_stats(), entries);
        let later = Utc::now() + chrono::Duration::seconds(10);
        let live = snapshot.live_entries(later);

        assert_eq!(live.len(), 1);
        assert!(live.contains_key("fresh"));
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(CacheSnapshot::<i32>::from_json("not json").is_err());
        assert!(CacheSnapshot::<i32>::from_json("{\"v\":1}").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip_preserves_keys(keys in proptest::collection::hash_set("[a-z_]{1,12}", 0..8)) {
            let mut entries = HashMap::new();
            for key in &keys {
                entries.insert(key.clone(), CacheEntry::new(key.len() as u64, Duration::from_secs(60)));
            }
            let snapshot = CacheSnapshot::new(CacheConfig::default(), sample_stats(), entries);
            let restored: CacheSnapshot<u64> =
                CacheSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
            let restored_keys: std::collections::HashSet<_> =
                restored.entries.keys().cloned().collect();
            prop_assert_eq!(restored_keys, keys);
        }
    }
}
