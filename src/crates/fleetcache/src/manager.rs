//! Generic TTL/LRU cache manager
//!
//! This module provides **[`CacheManager`]** - an in-memory key/value cache
//! with per-entry time-to-live, tag- and pattern-based bulk invalidation,
//! least-recently-read eviction under a size cap, hit/miss statistics, and
//! optional best-effort persistence through a [`SnapshotStore`].
//!
//! # Overview
//!
//! One `CacheManager` is one independent namespace. Handles are cheap to
//! clone and share state:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  CacheManager<V> (Clone)                                 │
//! │                                                          │
//! │  ┌────────────────────────────────────────────┐          │
//! │  │  Arc<ManagerShared<V>>                     │          │
//! │  │  • RwLock<HashMap<String, CacheEntry<V>>>  │          │
//! │  │  • RwLock<CacheConfig>                     │          │
//! │  │  • atomic hit/miss/eviction counters       │          │
//! │  │  • Option<Arc<dyn SnapshotStore>>          │          │
//! │  │  • background sweep task handle            │          │
//! │  └────────────────────────────────────────────┘          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Semantics worth knowing
//!
//! - **Lazy expiry**: expired entries are removed by the `get`/`has` call
//!   that discovers them, plus a periodic background sweep. [`keys`] reports
//!   literal map contents, unswept expired entries included.
//! - **Least-recently-read**: a successful `get` refreshes the entry's
//!   timestamp, so eviction order follows reads, not writes, and steady
//!   readers keep their entries alive indefinitely.
//! - **Eviction before insert**: `set` runs its capacity check before
//!   looking the key up. Overwriting an existing key at capacity therefore
//!   still evicts the least-recently-read entry. This mirrors the behavior
//!   of the system this cache was extracted from and is kept deliberately;
//!   see [`CacheManager::set_with`].
//! - **O(n) eviction**: the victim is found by a linear minimum-timestamp
//!   scan. Fine for the intended sizes (hundreds to low thousands of
//!   entries); a known scalability ceiling beyond that.
//! - **No single-flight**: concurrent [`get_or_set`] calls on the same
//!   missing key may each invoke their factory; the last write wins.
//!
//! [`keys`]: CacheManager::keys
//! [`get_or_set`]: CacheManager::get_or_set
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fleetcache::{CacheConfig, CacheManager, SetOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache: CacheManager<String> = CacheManager::new(CacheConfig::api()).await;
//!
//!     cache
//!         .set_with(
//!             "vehicle_42",
//!             "idle".to_string(),
//!             SetOptions::new()
//!                 .with_ttl(Duration::from_secs(30))
//!                 .with_tag("vehicles"),
//!         )
//!         .await;
//!
//!     assert_eq!(cache.get("vehicle_42").await, Some("idle".to_string()));
//!     cache.invalidate_by_tags(&["vehicles"]).await;
//!     assert_eq!(cache.get("vehicle_42").await, None);
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{CacheConfig, CacheConfigUpdate};
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::snapshot::CacheSnapshot;
use crate::stats::{CacheStats, StatsCounters};
use crate::store::SharedSnapshotStore;

/// Per-call options for `set`-family operations
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// TTL override; falls back to the cache's default TTL when unset
    pub ttl: Option<Duration>,

    /// Invalidation tags to attach to the entry
    pub tags: HashSet<String>,

    /// Opaque caller metadata to attach to the entry
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SetOptions {
    /// Create empty options (default TTL, no tags, no metadata)
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the TTL for this entry
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Add a single invalidation tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Replace the tag set
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach caller metadata
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// State shared by all handles of one cache instance
struct ManagerShared<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    config: RwLock<CacheConfig>,
    stats: StatsCounters,
    store: Option<SharedSnapshotStore>,
    sweeper: StdMutex<Option<JoinHandle<()>>>,
}

/// In-memory TTL/LRU cache with tag invalidation and snapshot persistence
///
/// See the [module documentation](self) for semantics. Construct instances
/// at your composition root and hand clones to the components that need
/// them; each instance is a fully independent namespace.
///
/// Constructors spawn the background sweep task and therefore must run
/// inside a Tokio runtime.
pub struct CacheManager<V> {
    shared: Arc<ManagerShared<V>>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> CacheManager<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a memory-only cache
    ///
    /// With no snapshot store attached, the `persist` config flag has no
    /// effect and all state is lost when the instance is dropped.
    pub async fn new(config: CacheConfig) -> Self {
        Self::build(config, None).await
    }

    /// Create a cache backed by a snapshot store
    ///
    /// When `config.persist` is on, previously persisted state is loaded
    /// through [`import`](Self::import) before the instance is returned, and
    /// every mutation afterwards rewrites the snapshot. Store failures in
    /// either direction are logged and swallowed; the cache degrades to
    /// memory-only operation.
    pub async fn with_store(config: CacheConfig, store: SharedSnapshotStore) -> Self {
        Self::build(config, Some(store)).await
    }

    async fn build(config: CacheConfig, store: Option<SharedSnapshotStore>) -> Self {
        let sweep_interval = config.sweep_interval;
        let persist = config.persist;
        let snapshot_key = config.snapshot_key.clone();

        let manager = Self {
            shared: Arc::new(ManagerShared {
                entries: RwLock::new(HashMap::new()),
                config: RwLock::new(config),
                stats: StatsCounters::default(),
                store,
                sweeper: StdMutex::new(None),
            }),
        };

        if persist {
            if let Some(store) = manager.shared.store.as_ref() {
                match store.load(&snapshot_key).await {
                    Ok(Some(payload)) => {
                        manager.import(&payload).await;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(error = %err, "snapshot store read failed; starting with an empty cache");
                    }
                }
            }
        }

        manager.start_sweeper(sweep_interval);
        manager
    }

    /// Insert or overwrite an entry with default options
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.set_with(key, value, SetOptions::default()).await;
    }

    /// Insert or overwrite an entry
    ///
    /// If the map already holds `max_size` entries, the entry with the
    /// oldest timestamp is evicted first. The capacity check runs before the
    /// key lookup, so an overwrite at capacity still evicts the
    /// least-recently-read entry even though the map would not have grown.
    /// That quirk is carried over intentionally from the system this cache
    /// replaces; callers that overwrite hot keys at capacity should size the
    /// cache with one entry of headroom.
    pub async fn set_with(&self, key: impl Into<String>, value: V, options: SetOptions) {
        let key = key.into();
        let (default_ttl, max_size) = {
            let config = self.shared.config.read().await;
            (config.default_ttl, config.max_size)
        };
        let ttl = options.ttl.unwrap_or(default_ttl);

        {
            let mut entries = self.shared.entries.write().await;
            if entries.len() >= max_size {
                // Linear minimum-timestamp scan; O(n) per eviction.
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.timestamp)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                    self.shared.stats.record_eviction();
                }
            }

            entries.insert(
                key,
                CacheEntry::new(value, ttl)
                    .with_tags(options.tags)
                    .with_metadata(options.metadata),
            );
        }

        Self::persist_shared(&self.shared).await;
    }

    /// Read an entry, refreshing its LRU clock on success
    ///
    /// Returns `None` for absent keys and for entries found expired; the
    /// latter are removed on the spot. Updates hit/miss accounting either
    /// way.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        let mut entries = self.shared.entries.write().await;

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.shared.stats.record_miss();
                return None;
            }
        };

        if expired {
            entries.remove(key);
            self.shared.stats.record_expirations(1);
            self.shared.stats.record_miss();
            return None;
        }

        // Present and fresh; the touch is what makes eviction
        // least-recently-read rather than least-recently-written.
        let entry = entries.get_mut(key)?;
        entry.touch(now);
        self.shared.stats.record_hit();
        Some(entry.value.clone())
    }

    /// Read an entry or populate it from `factory`
    ///
    /// On a miss the factory runs, its result is stored with `options`, and
    /// the value is returned. Factory errors propagate to the caller
    /// unchanged; nothing is stored and no retry happens.
    ///
    /// There is no per-key in-flight de-duplication: concurrent calls on the
    /// same missing key may each invoke their factory, and the last write
    /// wins. Callers needing single-flight semantics must layer it on top.
    pub async fn get_or_set<F, Fut>(
        &self,
        key: impl Into<String>,
        factory: F,
        options: SetOptions,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let key = key.into();
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = factory().await?;
        self.set_with(key, value.clone(), options).await;
        Ok(value)
    }

    /// Whether a fresh entry exists for `key`
    ///
    /// Lazily removes the entry if it is found expired, like `get`, but
    /// never refreshes the LRU clock and never touches hit/miss statistics:
    /// existence probes must not skew eviction order or the hit rate.
    pub async fn has(&self, key: &str) -> bool {
        let now = Utc::now();
        let mut entries = self.shared.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Remove an entry; returns whether anything was removed
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self.shared.entries.write().await.remove(key).is_some();
        if removed {
            Self::persist_shared(&self.shared).await;
        }
        removed
    }

    /// Remove all entries and reset persisted state
    ///
    /// Cumulative statistics are kept; they describe the instance, not the
    /// current contents.
    pub async fn clear(&self) {
        self.shared.entries.write().await.clear();

        let (persist, snapshot_key) = {
            let config = self.shared.config.read().await;
            (config.persist, config.snapshot_key.clone())
        };
        if persist {
            if let Some(store) = self.shared.store.as_ref() {
                if let Err(err) = store.remove(&snapshot_key).await {
                    warn!(error = %err, "failed to reset persisted snapshot; continuing");
                }
            }
        }
    }

    /// Remove every entry whose tag set intersects `tags`; returns the count
    pub async fn invalidate_by_tags(&self, tags: &[&str]) -> usize {
        let removed = {
            let mut entries = self.shared.entries.write().await;
            let matching: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| tags.iter().any(|tag| entry.has_tag(tag)))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &matching {
                entries.remove(key);
            }
            matching.len()
        };

        if removed > 0 {
            Self::persist_shared(&self.shared).await;
        }
        removed
    }

    /// Remove every entry whose key matches `pattern`; returns the count
    pub async fn invalidate_by_pattern(&self, pattern: &Regex) -> usize {
        let removed = {
            let mut entries = self.shared.entries.write().await;
            let matching: Vec<String> = entries
                .keys()
                .filter(|key| pattern.is_match(key))
                .cloned()
                .collect();
            for key in &matching {
                entries.remove(key);
            }
            matching.len()
        };

        if removed > 0 {
            Self::persist_shared(&self.shared).await;
        }
        removed
    }

    /// Snapshot the statistics
    ///
    /// `memory_usage` is the serialized length of each key and entry times
    /// two - a rough two-bytes-per-character approximation for relative
    /// trending, not an allocator measurement.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.shared.entries.read().await;
        let memory = Self::estimate_memory(&entries);
        self.shared.stats.snapshot(entries.len(), memory)
    }

    /// All current keys, including expired-but-unswept ones
    ///
    /// This reflects literal map contents. Callers that need freshness must
    /// go through [`has`](Self::has) or [`get`](Self::get).
    pub async fn keys(&self) -> Vec<String> {
        self.shared.entries.read().await.keys().cloned().collect()
    }

    /// All fresh entries carrying `tag`, as `(key, value)` pairs
    ///
    /// Does not refresh LRU clocks and does not touch statistics.
    pub async fn get_by_tag(&self, tag: &str) -> Vec<(String, V)> {
        let now = Utc::now();
        self.shared
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.has_tag(tag) && !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Populate many entries concurrently
    ///
    /// All factories run concurrently; each successful result is stored with
    /// its options. A failing factory is logged and skipped - it never
    /// aborts the rest of the batch.
    pub async fn warm_up<F, Fut>(&self, entries: Vec<(String, F, SetOptions)>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let tasks = entries.into_iter().map(|(key, factory, options)| async move {
            let result = factory().await;
            (key, options, result)
        });

        for (key, options, result) in futures::future::join_all(tasks).await {
            match result {
                Ok(value) => self.set_with(key, value, options).await,
                Err(err) => {
                    warn!(key = %key, error = %err, "warm-up factory failed; entry skipped");
                }
            }
        }
    }

    /// Serialize the full state - config, statistics, and raw entries
    /// (expired-but-unswept ones included) - to a JSON document
    pub async fn export(&self) -> Result<String> {
        Self::export_shared(&self.shared).await
    }

    /// Replace the entry map with the contents of an exported snapshot
    ///
    /// Entries already expired at import time are dropped. The running
    /// config and cumulative statistics are left untouched; the snapshot
    /// carries its originals for inspection only. A malformed payload is
    /// logged and ignored, leaving current entries as they were.
    ///
    /// Returns the number of entries imported.
    pub async fn import(&self, payload: &str) -> usize {
        match CacheSnapshot::<V>::from_json(payload) {
            Ok(snapshot) => {
                let live = snapshot.live_entries(Utc::now());
                let count = live.len();
                *self.shared.entries.write().await = live;
                Self::persist_shared(&self.shared).await;
                count
            }
            Err(err) => {
                warn!(error = %err, "cache import failed; keeping existing entries");
                0
            }
        }
    }

    /// Merge a partial configuration update
    ///
    /// If the default TTL actually changes, the background sweep task is
    /// restarted (stopped, then started with the current sweep interval).
    /// Only the timer restarts - TTLs already resolved onto existing entries
    /// are fixed at the time they were set.
    pub async fn update_config(&self, update: CacheConfigUpdate) {
        let (ttl_changed, sweep_interval) = {
            let mut config = self.shared.config.write().await;
            let previous_ttl = config.default_ttl;
            config.apply(update);
            (config.default_ttl != previous_ttl, config.sweep_interval)
        };

        if ttl_changed {
            self.stop_sweeper();
            self.start_sweeper(sweep_interval);
        }
    }

    /// Current configuration
    pub async fn config(&self) -> CacheConfig {
        self.shared.config.read().await.clone()
    }

    /// Proactively remove all expired entries; returns the count removed
    pub async fn cleanup(&self) -> usize {
        let removed = Self::cleanup_shared(&self.shared).await;
        if removed > 0 {
            Self::persist_shared(&self.shared).await;
        }
        removed
    }

    /// Stop the background sweep and drop all entries
    ///
    /// The handle is inert afterwards: no sweep runs, and the map stays
    /// empty until someone writes to it again. Intended as the end of the
    /// instance's life.
    pub async fn destroy(&self) {
        self.stop_sweeper();
        self.shared.entries.write().await.clear();
    }

    /// Number of entries currently in the map, unswept expired ones included
    pub async fn len(&self) -> usize {
        self.shared.entries.read().await.len()
    }

    /// Whether the map is empty
    pub async fn is_empty(&self) -> bool {
        self.shared.entries.read().await.is_empty()
    }

    fn start_sweeper(&self, interval: Duration) {
        // A zero interval would make tokio's timer panic.
        let interval = interval.max(Duration::from_millis(1));
        let weak = Arc::downgrade(&self.shared);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the sweep cadence
            // starts one full interval after construction.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let removed = Self::cleanup_shared(&shared).await;
                if removed > 0 {
                    debug!(removed, "background sweep removed expired entries");
                    Self::persist_shared(&shared).await;
                }
            }
        });

        if let Ok(mut guard) = self.shared.sweeper.lock() {
            if let Some(previous) = guard.replace(handle) {
                previous.abort();
            }
        }
    }

    fn stop_sweeper(&self) {
        if let Ok(mut guard) = self.shared.sweeper.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }

    async fn cleanup_shared(shared: &ManagerShared<V>) -> usize {
        let now = Utc::now();
        let mut entries = shared.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.remove(key);
        }
        shared.stats.record_expirations(expired.len() as u64);
        expired.len()
    }

    async fn export_shared(shared: &ManagerShared<V>) -> Result<String> {
        let config = shared.config.read().await.clone();
        let entries = shared.entries.read().await.clone();
        let stats = shared.stats.snapshot(entries.len(), Self::estimate_memory(&entries));
        CacheSnapshot::new(config, stats, entries).to_json()
    }

    async fn persist_shared(shared: &ManagerShared<V>) {
        let (persist, snapshot_key) = {
            let config = shared.config.read().await;
            (config.persist, config.snapshot_key.clone())
        };
        if !persist {
            return;
        }
        let Some(store) = shared.store.as_ref() else {
            return;
        };

        let payload = match Self::export_shared(shared).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize cache snapshot; skipping persistence");
                return;
            }
        };
        if let Err(err) = store.save(&snapshot_key, &payload).await {
            warn!(error = %err, "snapshot store write failed; continuing in memory only");
        }
    }

    fn estimate_memory(entries: &HashMap<String, CacheEntry<V>>) -> u64 {
        entries
            .iter()
            .map(|(key, entry)| {
                let entry_len = serde_json::to_string(entry).map(|s| s.len()).unwrap_or(0);
                ((key.len() + entry_len) * 2) as u64
            })
            .sum()
    }
}

impl<V> Drop for ManagerShared<V> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.sweeper.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
