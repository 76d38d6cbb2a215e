/// JSON file backing for the comparison cache.
///
/// The whole snapshot is one JSON document, written atomically via a
/// temp-file rename so an interrupt mid-checkpoint never leaves a corrupt
/// cache behind.
use std::path::PathBuf;

use trendrank_core::{CacheSnapshot, CacheStore, StoreError};

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }
}

impl CacheStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<CacheSnapshot>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let snapshot: CacheSnapshot = serde_json::from_str(&content).map_err(|e| {
            StoreError(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &CacheSnapshot) -> Result<(), StoreError> {
        let content = serde_json::to_string(snapshot)
            .map_err(|e| StoreError(format!("failed to serialize cache: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .map_err(|e| StoreError(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}
