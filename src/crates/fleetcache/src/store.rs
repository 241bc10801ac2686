//! Pluggable snapshot storage for cross-session persistence
//!
//! This module defines the **[`SnapshotStore`]** trait - the boundary between
//! a cache instance and whatever flat key-value storage keeps its serialized
//! state alive between sessions. The cache treats the store as best-effort:
//! read and write failures are logged and swallowed by the caller, never
//! propagated to application code.
//!
//! Two reference implementations ship with the crate:
//!
//! - [`MemorySnapshotStore`] - process-local map; useful in tests and for
//!   sharing state between instances inside one process
//! - [`FileSnapshotStore`] - one JSON document per logical key under a root
//!   directory
//!
//! # Implementing a custom backend
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use fleetcache::{Result, SnapshotStore};
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

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CacheError, Result};

/// Shared handle to a snapshot store
pub type SharedSnapshotStore = Arc<dyn SnapshotStore>;

/// Flat key-value storage for serialized cache snapshots
///
/// Payloads are opaque strings; the cache owns their format. Implementations
/// must be safe to share across tasks.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the payload stored under `key`, if any
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write `payload` under `key`, replacing any previous value
    async fn save(&self, key: &str, payload: &str) -> Result<()>;

    /// Delete the payload under `key`; absent keys are not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory snapshot store
///
/// Clones share the same underlying map, so one instance can act as the
/// "storage" seen by several caches in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no payloads
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, payload: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-backed snapshot store: one JSON document per logical key
///
/// Keys map to file names directly, so they must be valid path components.
/// The root directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the store writes into
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) {
            return Err(CacheError::Store(format!(
                "snapshot key {:?} is not a valid file name",
                key
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, key: &str, payload: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, payload).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.load("missing").await.unwrap(), None);

        store.save("k", "payload").await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some("payload".to_string()));

        store.save("k", "replaced").await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some("replaced".to_string()));
        assert_eq!(store.len().await, 1);

        store.remove("k").await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemorySnapshotStore::new();
        let alias = store.clone();

        store.save("k", "v").await.unwrap();
        assert_eq!(alias.load("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        assert_eq!(store.load("session").await.unwrap(), None);

        store.save("session", "{\"v\":1}").await.unwrap();
        assert_eq!(
            store.load("session").await.unwrap(),
            Some("{\"v\":1}".to_string())
        );
        assert!(dir.path().join("session.json").exists());

        store.remove("session").await.unwrap();
        assert_eq!(store.load("session").await.unwrap(), None);
        // Removing again is not an error.
        store.remove("session").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        assert!(store.save("../escape", "x").await.is_err());
        assert!(store.load("").await.is_err());
    }
}
