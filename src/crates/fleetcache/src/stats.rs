//! Hit/miss accounting and statistics snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Shared atomic counters, updated by every handle of a cache instance.
///
/// Counters are cumulative for the lifetime of the instance; `clear` does
/// not reset them.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl StatsCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expirations(&self, count: u64) {
        if count > 0 {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Snapshot the counters together with derived figures
    pub fn snapshot(&self, total_entries: usize, memory_usage: u64) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            total_entries,
            memory_usage,
            hit_rate: hit_rate(hits, misses),
        }
    }
}

/// Hit rate as a percentage; zero before any lookup has happened
fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64) * 100.0
    }
}

/// Point-in-time view of cache statistics
///
/// `memory_usage` is a best-effort byte estimate (serialized length times
/// two, approximating a two-byte character encoding). Useful for relative
/// trending only, never for capacity planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Reads that returned a fresh entry
    pub hits: u64,

    /// Reads that found nothing, or found only an expired entry
    pub misses: u64,

    /// Entries removed by LRU eviction
    pub evictions: u64,

    /// Entries removed because their TTL elapsed
    pub expirations: u64,

    /// Current entry count, unswept expired entries included
    pub total_entries: usize,

    /// Approximate resident size in bytes
    pub memory_usage: u64,

    /// `hits / (hits + misses) * 100`, or 0 with no lookups yet
    pub hit_rate: f64,
}
