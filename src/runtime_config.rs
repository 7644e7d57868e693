//! # Runtime Configuration Module
//!
//! Environment variable-based settings for the edge runtime.
//!
//! ## Environment Variables
//!
//! ### `BRRTE_MANIFEST_DIR`
//!
//! Directory holding `routes-manifest.json`, `pages-manifest.json` and the
//! optional prerender manifest, public file list and build options.
//!
//! Default: `.serverless_nextjs`
//!
//! ### `BRRTE_LONG_TTL_SECS`
//!
//! `s-maxage` used for content that never regenerates and for the 404
//! page served on a miss.
//!
//! Default: `2678400` (31 days)
//!
//! ## Usage
//!
//! ```rust
//! use brrtedge::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Manifests: {}", config.manifest_dir.display());
//! ```
//!
//! ```bash
//! export BRRTE_MANIFEST_DIR=/var/task/.serverless_nextjs
//! export BRRTE_LONG_TTL_SECS=86400
//! ```

use std::env;
use std::path::PathBuf;

use crate::regeneration::{CachePolicy, DEFAULT_LONG_TTL_SECS};

pub const DEFAULT_MANIFEST_DIR: &str = ".serverless_nextjs";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub manifest_dir: PathBuf,
    /// Long TTL in seconds (default: 31 days)
    pub long_ttl_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            manifest_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            long_ttl_secs: DEFAULT_LONG_TTL_SECS,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Unparseable or zero TTLs fall back to the default.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_dir = lookup("BRRTE_MANIFEST_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_MANIFEST_DIR), PathBuf::from);
        let long_ttl_secs = lookup("BRRTE_LONG_TTL_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_LONG_TTL_SECS);
        RuntimeConfig {
            manifest_dir,
            long_ttl_secs,
        }
    }

    /// Cache policy for the origin-response flow.
    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::new(self.long_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[]));
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.manifest_dir, PathBuf::from(".serverless_nextjs"));
        assert_eq!(config.long_ttl_secs, 2_678_400);
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("BRRTE_MANIFEST_DIR", "/srv/manifests"),
            ("BRRTE_LONG_TTL_SECS", "86400"),
        ]));
        assert_eq!(config.manifest_dir, PathBuf::from("/srv/manifests"));
        assert_eq!(config.long_ttl_secs, 86_400);
    }

    #[test]
    fn test_cache_policy_uses_long_ttl() {
        let config = RuntimeConfig::from_lookup(lookup(&[("BRRTE_LONG_TTL_SECS", "600")]));
        assert_eq!(config.cache_policy().long_ttl_secs, 600);
    }

    #[test]
    fn test_invalid_ttl_falls_back() {
        for bad in ["abc", "-5", "0", ""] {
            let config = RuntimeConfig::from_lookup(lookup(&[("BRRTE_LONG_TTL_SECS", bad)]));
            assert_eq!(config.long_ttl_secs, DEFAULT_LONG_TTL_SECS, "value {bad:?}");
        }
    }
}
