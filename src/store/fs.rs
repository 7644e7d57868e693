use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

use super::{Artifact, ArtifactStore, StoreError};

const META_SUFFIX: &str = ".meta.json";

/// Sidecar written next to each artifact body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactMeta {
    content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_control: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<i64>,
}

/// Artifact store backed by a directory.
///
/// Bodies are written to `<root>/<key>`, metadata to `<root>/<key>.meta.json`.
pub struct FsArtifactStore {
    base_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    /// Map a key under the root, refusing `..`, absolute and prefix
    /// components.
    fn map_path(&self, key: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        let mut pushed = false;
        for comp in Path::new(key.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => {
                    pb.push(s);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        pushed.then_some(pb)
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(META_SUFFIX);
        PathBuf::from(name)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            _ => "application/octet-stream",
        }
    }

    fn io_error(key: &str, source: io::Error) -> StoreError {
        error!(key = %key, error = %source, "Artifact store I/O failed");
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, artifact: Artifact) -> Result<(), StoreError> {
        let path = self
            .map_path(&artifact.key)
            .ok_or_else(|| StoreError::InvalidKey(artifact.key.clone()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_error(&artifact.key, e))?;
        }

        let meta = ArtifactMeta {
            content_type: artifact.content_type.clone(),
            cache_control: artifact.cache_control.clone(),
            expires: artifact.expires.map(|t| t.timestamp()),
        };
        let meta_json = serde_json::to_vec(&meta).map_err(|e| StoreError::Corrupt {
            key: artifact.key.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, &artifact.body).map_err(|e| Self::io_error(&artifact.key, e))?;
        fs::write(Self::meta_path(&path), meta_json)
            .map_err(|e| Self::io_error(&artifact.key, e))?;
        debug!(key = %artifact.key, path = %path.display(), "Artifact written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Artifact>, StoreError> {
        let path = self
            .map_path(key)
            .ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        if !path.is_file() {
            return Ok(None);
        }
        let body = fs::read(&path).map_err(|e| Self::io_error(key, e))?;

        let meta_path = Self::meta_path(&path);
        let meta = if meta_path.is_file() {
            let raw = fs::read(&meta_path).map_err(|e| Self::io_error(key, e))?;
            serde_json::from_slice::<ArtifactMeta>(&raw).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })?
        } else {
            ArtifactMeta {
                content_type: Self::content_type(&path).to_string(),
                cache_control: None,
                expires: None,
            }
        };

        Ok(Some(Artifact {
            key: key.to_string(),
            body,
            content_type: meta.content_type,
            cache_control: meta.cache_control,
            expires: meta
                .expires
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        }))
    }
}
