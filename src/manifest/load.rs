use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::build::prepare_build_manifests;
use super::types::{BuildManifests, BuildOptions, OrderedMap, PrerenderManifest, RoutesManifest};

pub const ROUTES_MANIFEST: &str = "routes-manifest.json";
pub const PAGES_MANIFEST: &str = "pages-manifest.json";
pub const PRERENDER_MANIFEST: &str = "prerender-manifest.json";
pub const PUBLIC_FILES: &str = "public-files.json";
pub const PUBLIC_DIR: &str = "public";
pub const BUILD_ID_FILE: &str = "BUILD_ID";
const BUILD_OPTIONS: [&str; 3] = ["build-options.yaml", "build-options.yml", "build-options.json"];

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_optional_json<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    if path.exists() {
        read_json(path)
    } else {
        debug!(path = %path.display(), "Optional manifest missing, using defaults");
        Ok(T::default())
    }
}

/// Load build options from YAML or JSON, chosen by file extension.
pub fn load_build_options(path: &Path) -> anyhow::Result<BuildOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let options = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?
    };
    Ok(options)
}

/// Collect files under `public/` as `/`-separated paths relative to it.
fn scan_public_dir(root: &Path) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("failed to list {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
    }
    files.sort();
    Ok(files)
}

/// Load and prepare all manifests from a build output directory.
///
/// `routes-manifest.json` and `pages-manifest.json` are required. The
/// prerender manifest, public file list and build options are optional. The
/// public file list comes from `public-files.json` or, failing that, a scan of
/// `public/`. A missing `buildId` is read from the `BUILD_ID` file.
///
/// # Errors
///
/// Any unreadable or malformed file is an error naming that file.
pub fn load_manifests(dir: impl AsRef<Path>) -> anyhow::Result<BuildManifests> {
    let dir = dir.as_ref();

    let routes: RoutesManifest = read_json(&dir.join(ROUTES_MANIFEST))?;
    let pages: OrderedMap<String> = read_json(&dir.join(PAGES_MANIFEST))?;
    let prerender: PrerenderManifest = read_optional_json(&dir.join(PRERENDER_MANIFEST))?;

    let public_files: Vec<String> = if dir.join(PUBLIC_FILES).exists() {
        read_json(&dir.join(PUBLIC_FILES))?
    } else if dir.join(PUBLIC_DIR).is_dir() {
        scan_public_dir(&dir.join(PUBLIC_DIR))?
    } else {
        Vec::new()
    };

    let mut options = match BUILD_OPTIONS
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
    {
        Some(path) => load_build_options(&path)?,
        None => BuildOptions::default(),
    };
    if options.build_id.is_empty() {
        let build_id_path = dir.join(BUILD_ID_FILE);
        if build_id_path.exists() {
            options.build_id = fs::read_to_string(&build_id_path)
                .with_context(|| format!("failed to read {}", build_id_path.display()))?
                .trim()
                .to_string();
        }
    }

    info!(
        manifest_dir = %dir.display(),
        build_id = %options.build_id,
        "Manifests loaded"
    );

    Ok(prepare_build_manifests(
        options,
        routes,
        &pages,
        prerender,
        &public_files,
    ))
}
