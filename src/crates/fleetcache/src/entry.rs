//! Cache entry with expiry and access metadata.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single cached record.
///
/// The `timestamp` field serves double duty: it is both the reference point
/// for TTL expiry and the least-recently-used clock. Every successful read
/// refreshes it, which makes eviction order least-recently-*read* and gives
/// entries sliding expiry under steady access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// Last-read (or last-written) instant; doubles as the LRU clock
    pub timestamp: DateTime<Utc>,

    /// Time-to-live, resolved against the cache default at insert time
    pub ttl: Duration,

    /// Labels for bulk invalidation
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub tags: HashSet<String>,

    /// Caller-owned annotations, opaque to the cache
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<V> CacheEntry<V> {
    /// Creates a new entry stamped with the current instant
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
            ttl,
            tags: HashSet::new(),
            metadata: HashMap::new(),
        }
    }

    /// Attach invalidation tags
    pub fn with_tags(mut self, tags: HashSet<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attach caller metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the entry is stale as of `now`
    ///
    /// An entry expires strictly *after* its TTL elapses: elapsed time equal
    /// to the TTL is still fresh.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.timestamp);
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::max_value());
        elapsed > ttl
    }

    /// Refreshes the LRU clock after a successful read
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.timestamp = now;
    }

    /// Remaining TTL as of `now` (`None` once expired)
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired_at(now) {
            return None;
        }
        let elapsed = now.signed_duration_since(self.timestamp).to_std().ok()?;
        self.ttl.checked_sub(elapsed)
    }

    /// Whether the entry carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Consumes the entry and returns the value
    pub fn into_value(self) -> V {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test value", Duration::from_secs(60));
        assert_eq!(entry.value, "test value");
        assert!(entry.tags.is_empty());
        assert!(entry.metadata.is_empty());
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry::new(1, Duration::from_millis(100));

        let at_fifty = entry.timestamp + chrono::Duration::milliseconds(50);
        assert!(!entry.is_expired_at(at_fifty));

        // Elapsed == TTL is still fresh; expiry is strictly greater-than.
        let at_hundred = entry.timestamp + chrono::Duration::milliseconds(100);
        assert!(!entry.is_expired_at(at_hundred));

        let at_one_fifty = entry.timestamp + chrono::Duration::milliseconds(150);
        assert!(entry.is_expired_at(at_one_fifty));
    }

    #[test]
    fn test_touch_resets_expiry() {
        let mut entry = CacheEntry::new(1, Duration::from_millis(100));
        let later = entry.timestamp + chrono::Duration::milliseconds(90);
        entry.touch(later);

        // Without the touch this instant would be past the original TTL.
        let probe = later + chrono::Duration::milliseconds(60);
        assert!(!entry.is_expired_at(probe));
    }

    #[test]
    fn test_remaining_ttl() {
        let entry = CacheEntry::new(1, Duration::from_secs(60));
        let later = entry.timestamp + chrono::Duration::seconds(20);

        let remaining = entry.remaining_ttl(later).unwrap();
        assert_eq!(remaining, Duration::from_secs(40));

        let past = entry.timestamp + chrono::Duration::seconds(61);
        assert!(entry.remaining_ttl(past).is_none());
    }

    #[test]
    fn test_tags_and_metadata() {
        let mut tags = HashSet::new();
        tags.insert("vehicles".to_string());

        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), serde_json::json!("api"));

        let entry = CacheEntry::new(1, Duration::from_secs(1))
            .with_tags(tags)
            .with_metadata(metadata);

        assert!(entry.has_tag("vehicles"));
        assert!(!entry.has_tag("drivers"));
        assert_eq!(entry.metadata.get("source"), Some(&serde_json::json!("api")));
    }

    #[test]
    fn test_serde_round_trip() {
        let entry = CacheEntry::new(vec![1, 2, 3], Duration::from_secs(5));
        let json = serde_json::to_string(&entry).unwrap();
        let restored: CacheEntry<Vec<i32>> = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.value, vec![1, 2, 3]);
        assert_eq!(restored.ttl, Duration::from_secs(5));
        assert_eq!(restored.timestamp, entry.timestamp);
    }

    proptest! {
        #[test]
        fn prop_expiry_strictly_after_ttl(ttl_ms in 1u64..=86_400_000, elapsed_ms in 0u64..=172_800_000) {
            let entry = CacheEntry::new(0u8, Duration::from_millis(ttl_ms));
            let probe = entry.timestamp + chrono::Duration::milliseconds(elapsed_ms as i64);
            prop_assert_eq!(entry.is_expired_at(probe), elapsed_ms > ttl_ms);
        }
    }
}
