use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use tracing::debug;

use super::{Artifact, ArtifactStore, StoreError};

/// In-process artifact store.
///
/// Keeps the order of `put` calls so callers can check that page data is
/// written before its HTML.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Artifact>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryArtifactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an artifact without recording it as a write (seeding).
    pub fn seed(&self, artifact: Artifact) -> Result<(), StoreError> {
        self.artifacts
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .insert(artifact.key.clone(), artifact);
        Ok(())
    }

    /// Keys in the order they were written by [`ArtifactStore::put`].
    pub fn keys_written(&self) -> Result<Vec<String>, StoreError> {
        self.writes
            .lock()
            .map(|w| w.clone())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn put(&self, artifact: Artifact) -> Result<(), StoreError> {
        if artifact.key.is_empty() {
            return Err(StoreError::InvalidKey(artifact.key));
        }
        debug!(key = %artifact.key, bytes = artifact.body.len(), "Storing artifact");
        self.writes
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .push(artifact.key.clone());
        self.seed(artifact)
    }

    fn get(&self, key: &str) -> Result<Option<Artifact>, StoreError> {
        Ok(self
            .artifacts
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .get(key)
            .cloned())
    }
}
