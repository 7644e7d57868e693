//! # Store Module
//!
//! Durable storage for rendered artifacts, behind the [`ArtifactStore`]
//! collaborator trait.
//!
//! Keys are deterministic (`static-pages/<buildId>/<page>.html`,
//! `_next/data/<buildId>/<page>.json`) and writes are idempotent: the last
//! write for a key wins. Failures are returned to the caller and never
//! retried here.
//!
//! - [`MemoryArtifactStore`] - in-process map, records write order
//! - [`FsArtifactStore`] - files under a directory with a JSON metadata sidecar

mod fs;
mod memory;

pub use self::fs::FsArtifactStore;
pub use self::memory::MemoryArtifactStore;

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;

/// One persisted output: page HTML or page data JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

impl Artifact {
    #[must_use]
    pub fn new(key: impl Into<String>, body: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
            content_type: content_type.to_string(),
            cache_control: None,
            expires: None,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The key escapes the store root or is empty.
    InvalidKey(String),
    Io { key: String, source: io::Error },
    /// Stored metadata could not be decoded.
    Corrupt { key: String, message: String },
    /// A lock was poisoned by a panicking writer.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidKey(key) => write!(f, "invalid artifact key '{key}'"),
            StoreError::Io { key, source } => write!(f, "artifact '{key}': {source}"),
            StoreError::Corrupt { key, message } => {
                write!(f, "artifact '{key}' has corrupt metadata: {message}")
            }
            StoreError::Unavailable(message) => write!(f, "artifact store unavailable: {message}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Artifact storage collaborator.
pub trait ArtifactStore: Send + Sync {
    /// Store or replace the artifact under `artifact.key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn put(&self, artifact: Artifact) -> Result<(), StoreError>;

    /// Fetch an artifact; `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, key: &str) -> Result<Option<Artifact>, StoreError>;
}
