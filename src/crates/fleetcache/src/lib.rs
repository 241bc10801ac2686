//! # fleetcache - TTL/LRU Caching for Fleet Dashboards
//!
//! **Generic in-memory key/value caching** with per-entry time-to-live,
//! tag- and pattern-based bulk invalidation, least-recently-read eviction,
//! hit/miss statistics, and optional snapshot persistence. Built for
//! dashboard-style workloads: hundreds to low thousands of entries per
//! cache, read-heavy, with occasional bulk invalidation when backend data
//! changes.
//!
//! ## Overview
//!
//! A [`CacheManager`] is one independent cache namespace. Typical
//! deployments run several side by side with different policies:
//!
//! - **API cache** - short TTLs for upstream API responses
//! - **General cache** - medium TTLs for computed views
//! - **User-data cache** - long TTLs with persistence across sessions
//!
//! The [`CacheConfig`] presets ([`CacheConfig::api`], [`CacheConfig::general`],
//! [`CacheConfig::user_data`]) encode exactly those three policies.
//!
//! ## Core Concepts
//!
//! ### 1. Entries, TTL, and the LRU Clock
//!
//! Every entry carries one timestamp that serves both as its TTL reference
//! and its recency mark. A successful `get` refreshes it, which gives
//! entries **sliding expiry**: an entry read more often than its TTL never
//! expires, and eviction under the size cap removes the entry read least
//! recently. Expiry is strict - an entry is expired only once its age
//! *exceeds* its TTL.
//!
//! ### 2. Invalidation
//!
//! Entries can carry free-form **tags**. [`CacheManager::invalidate_by_tags`]
//! removes every entry sharing a tag with the given set;
//! [`CacheManager::invalidate_by_pattern`] removes every entry whose key
//! matches a [`regex::Regex`]. Both return the number of entries removed.
//!
//! ### 3. Statistics
//!
//! Hits, misses, evictions, and expirations are counted per instance;
//! [`CacheManager::stats`] snapshots them as a [`CacheStats`] along with a
//! rough serialized-size memory estimate. Existence probes via
//! [`CacheManager::has`] deliberately stay out of the accounting.
//!
//! ### 4. Persistence
//!
//! The [`SnapshotStore`] trait abstracts a flat string key/value backend.
//! When a cache is built with [`CacheManager::with_store`] and
//! `persist` enabled, every mutation rewrites a JSON snapshot and
//! construction reloads it, dropping entries that expired while the
//! process was down. Persistence is **best effort**: store failures are
//! logged and the cache keeps serving from memory.
//!
//! This crate ships [`MemorySnapshotStore`] (tests, reference) and
//! [`FileSnapshotStore`] (one JSON file per snapshot key). Implement
//! [`SnapshotStore`] for anything else:
//!
//! ```rust,ignore
//! use fleetcache::{Result, SnapshotStore};
//! use async_trait::async_trait;
//!
//! struct RedisSnapshotStore {
//!     client: redis::Client,
//! }
//!
//! #[async_trait]
//! impl SnapshotStore for RedisSnapshotStore {
//!     async fn load(&self, key: &str) -> Result<Option<String>> {
//!         // GET key
//!         # unimplemented!()
//!     }
//!
//!     async fn save(&self, key: &str, payload: &str) -> Result<()> {
//!         // SET key payload
//!         # unimplemented!()
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<()> {
//!         // DEL key
//!         # unimplemented!()
//!     }
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleetcache::{CacheConfig, CacheManager, SetOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache: CacheManager<serde_json::Value> =
//!         CacheManager::new(CacheConfig::api()).await;
//!
//!     // Populate through a factory; the second call is a cache hit.
//!     let status = cache
//!         .get_or_set(
//!             "fleet_status",
//!             || async { Ok(serde_json::json!({"active": 12, "idle": 3})) },
//!             SetOptions::new()
//!                 .with_ttl(Duration::from_secs(30))
//!                 .with_tag("fleet"),
//!         )
//!         .await?;
//!     println!("fleet status: {status}");
//!
//!     // Backend data changed; drop everything fleet-related.
//!     let removed = cache.invalidate_by_tags(&["fleet"]).await;
//!     println!("invalidated {removed} entries");
//!
//!     let stats = cache.stats().await;
//!     println!("hit rate: {:.1}%", stats.hit_rate);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Application Components                   │
//! │        (clone CacheManager handles as needed)            │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  CacheManager<V> (This Crate)            │
//! │  • get / set / has / delete / clear                      │
//! │  • get_or_set / warm_up (factory population)             │
//! │  • invalidate_by_tags / invalidate_by_pattern            │
//! │  • export / import / stats / cleanup                     │
//! │  • background sweep task                                 │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ JSON snapshots (best effort)
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  SnapshotStore Trait                     │
//! └──────┬──────────────────────┬───────────────────┬────────┘
//!        ▼                      ▼                   ▼
//!  ┌───────────┐       ┌───────────────┐      ┌─────────┐
//!  │  Memory   │       │  File (JSON)  │      │ Custom  │
//!  │ (tests)   │       │               │      │         │
//!  └───────────┘       └───────────────┘      └─────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`manager`] - [`CacheManager`] and [`SetOptions`]
//! - [`entry`] - [`CacheEntry`] with TTL, tags, and metadata
//! - [`config`] - [`CacheConfig`], [`CacheConfigUpdate`], and presets
//! - [`stats`] - [`CacheStats`]
//! - [`store`] - [`SnapshotStore`] trait and backends
//! - [`snapshot`] - [`CacheSnapshot`] export/import format
//! - [`error`] - [`CacheError`] and the crate [`Result`] alias
//!
//! ## Performance Considerations
//!
//! - Eviction scans the whole map for the oldest timestamp: **O(n) per
//!   insert at capacity**. Fine at the intended scale; switch strategies
//!   before running tens of thousands of entries through one instance.
//! - [`CacheManager::get_or_set`] does **no in-flight de-duplication**.
//!   Concurrent misses on one key each run their factory; last write wins.
//! - Persistence rewrites the **entire snapshot on every mutation**.
//!   Reserve `persist` for small, slow-changing caches such as user data.

pub mod config;
pub mod entry;
pub mod error;
pub mod manager;
pub mod snapshot;
pub mod stats;
pub mod store;

pub use config::{CacheConfig, CacheConfigUpdate};
pub use entry::CacheEntry;
pub use error::{CacheError, Result};
pub use manager::{CacheManager, SetOptions};
pub use snapshot::CacheSnapshot;
pub use stats::CacheStats;
pub use store::{FileSnapshotStore, MemorySnapshotStore, SharedSnapshotStore, SnapshotStore};
