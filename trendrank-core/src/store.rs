/// Durable backing for the comparison cache.
///
/// The core only needs get-everything / put-everything semantics plus the
/// config fingerprint; whether that maps to a local JSON file or a remote
/// key-value service is the caller's business.
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::types::{MagnitudeProfile, QueryKey};

#[derive(Debug, Clone, thiserror::Error)]
#[error("cache store: {0}")]
pub struct StoreError(pub String);

/// One persisted cache entry. `profile: None` records a NoData answer —
/// a cached empty answer is still an answer and must not be re-fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub profile: Option<MagnitudeProfile>,
}

/// Everything the cache persists: the request-config fingerprint it was
/// built under, and all resolved entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub fingerprint: String,
    pub entries: Vec<CacheEntry>,
}

/// A durable mapping the cache can load at start and flush periodically.
pub trait CacheStore {
    /// Load the persisted snapshot, `None` if nothing was persisted yet.
    fn load(&mut self) -> Result<Option<CacheSnapshot>, StoreError>;

    /// Replace the persisted snapshot.
    fn save(&mut self, snapshot: &CacheSnapshot) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same snapshot, which lets tests open
/// a fresh cache "run" against the state a previous run persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Arc<Mutex<Option<CacheSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of persisted entries, 0 if nothing saved yet.
    pub fn entry_count(&self) -> usize {
        self.snapshot
            .lock()
            .map(|guard| guard.as_ref().map_or(0, |s| s.entries.len()))
            .unwrap_or(0)
    }
}

impl CacheStore for MemoryStore {
    fn load(&mut self) -> Result<Option<CacheSnapshot>, StoreError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| StoreError(format!("poisoned lock: {e}")))?;
        Ok(guard.clone())
    }

    fn save(&mut self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StoreError(format!("poisoned lock: {e}")))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}
