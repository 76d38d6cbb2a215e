/// Deduplicating comparison cache.
///
/// Sole owner of every magnitude profile ever fetched in a run. Each unique
/// query key is resolved externally at most once; everything after that is
/// served from memory. The cache is keyed jointly by item set and request
/// configuration — a persisted snapshot built under a different
/// configuration is discarded at open, never silently mixed in.
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::oracle::{Oracle, OracleError};
use crate::store::{CacheEntry, CacheSnapshot, CacheStore, StoreError};
use crate::types::{MagnitudeProfile, QueryKey, RequestConfig};

pub struct ComparisonCache<O: Oracle, S: CacheStore> {
    oracle: O,
    store: S,
    fingerprint: String,
    entries: HashMap<QueryKey, Option<MagnitudeProfile>>,
    oracle_calls: u64,
    /// Newly resolved keys since the last successful save.
    unsaved: usize,
    checkpoint_interval: usize,
}

impl<O: Oracle, S: CacheStore> ComparisonCache<O, S> {
    /// Open a cache for a run: load the persisted snapshot if its
    /// fingerprint matches the run's configuration, start empty otherwise.
    pub fn open(
        oracle: O,
        mut store: S,
        config: &RequestConfig,
        checkpoint_interval: usize,
    ) -> Result<Self, StoreError> {
        let fingerprint = config.fingerprint();
        let mut entries = HashMap::new();

        match store.load()? {
            Some(snapshot) if snapshot.fingerprint == fingerprint => {
                for entry in snapshot.entries {
                    entries.insert(entry.key, entry.profile);
                }
                debug!(entries = entries.len(), "loaded cache snapshot");
            }
            Some(snapshot) => {
                warn!(
                    persisted = %snapshot.fingerprint,
                    current = %fingerprint,
                    "request configuration changed; discarding persisted cache"
                );
            }
            None => {}
        }

        Ok(ComparisonCache {
            oracle,
            store,
            fingerprint,
            entries,
            oracle_calls: 0,
            unsaved: 0,
            checkpoint_interval: checkpoint_interval.max(1),
        })
    }

    /// Resolve one query key: cache hit returns the stored profile with no
    /// side effect; a miss makes exactly one external call and stores the
    /// answer, NoData included.
    pub async fn resolve(
        &mut self,
        key: &QueryKey,
    ) -> Result<Option<MagnitudeProfile>, OracleError> {
        if let Some(profile) = self.entries.get(key) {
            debug!(%key, "cache hit");
            return Ok(profile.clone());
        }

        debug!(%key, "cache miss; querying oracle");
        let profile = self.oracle.fetch(key).await?;
        self.oracle_calls += 1;
        self.entries.insert(key.clone(), profile.clone());

        self.unsaved += 1;
        if self.unsaved >= self.checkpoint_interval {
            // Checkpointing is a crash-loss bound, not a correctness
            // requirement: a failed save is logged and the run goes on.
            if let Err(e) = self.flush() {
                warn!(error = %e, "cache checkpoint failed");
            }
        }

        Ok(profile)
    }

    /// Number of external oracle calls made through this cache.
    pub fn oracle_calls(&self) -> u64 {
        self.oracle_calls
    }

    /// Number of resolved keys currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist everything resolved so far. Called on every exit path of a
    /// run; entries written here stay valid for subsequent runs under the
    /// same configuration.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let snapshot = CacheSnapshot {
            fingerprint: self.fingerprint.clone(),
            entries: self
                .entries
                .iter()
                .map(|(key, profile)| CacheEntry { key: key.clone(), profile: profile.clone() })
                .collect(),
        };
        self.store.save(&snapshot)?;
        self.unsaved = 0;
        Ok(())
    }
}
