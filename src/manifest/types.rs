use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

/// A JSON object that keeps document order.
///
/// Manifest order is significant (first listed wins on ties), and
/// `HashMap` would lose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Routes manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// Headers attached to every response whose path matches `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub source: String,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    pub source: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent: Option<bool>,
}

impl RedirectRule {
    /// Explicit `statusCode` wins; otherwise 308 for permanent, 307 for temporary.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match (self.status_code, self.permanent) {
            (Some(code), _) => code,
            (None, Some(false)) => 307,
            (None, _) => 308,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub source: String,
    pub destination: String,
}

/// Rewrites are either a plain list or the phased object form
/// (`beforeFiles`, `afterFiles`, `fallback`). The phased form is flattened in
/// that order.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRewrites {
    List(Vec<RewriteRule>),
    Phased {
        #[serde(default, rename = "beforeFiles")]
        before_files: Vec<RewriteRule>,
        #[serde(default, rename = "afterFiles")]
        after_files: Vec<RewriteRule>,
        #[serde(default)]
        fallback: Vec<RewriteRule>,
    },
}

fn deserialize_rewrites<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RewriteRule>, D::Error> {
    Ok(match Option::<RawRewrites>::deserialize(d)? {
        None => Vec::new(),
        Some(RawRewrites::List(list)) => list,
        Some(RawRewrites::Phased {
            before_files,
            after_files,
            fallback,
        }) => before_files
            .into_iter()
            .chain(after_files)
            .chain(fallback)
            .collect(),
    })
}

/// The routes manifest: base path plus ordered header, redirect and rewrite
/// rules. First match wins within each list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesManifest {
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub headers: Vec<HeaderRule>,
    #[serde(default)]
    pub redirects: Vec<RedirectRule>,
    #[serde(default, deserialize_with = "deserialize_rewrites")]
    pub rewrites: Vec<RewriteRule>,
}

// ---------------------------------------------------------------------------
// Prerender manifest
// ---------------------------------------------------------------------------

/// Revalidation window of a statically generated page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Revalidate {
    /// `false`: never regenerate; cache for the long TTL.
    #[default]
    Never,
    /// Regenerate once the artifact is older than this many seconds.
    After(u64),
}

impl Revalidate {
    #[must_use]
    pub fn seconds(self) -> Option<u64> {
        match self {
            Revalidate::Never => None,
            Revalidate::After(secs) => Some(secs),
        }
    }
}

impl fmt::Display for Revalidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revalidate::Never => f.write_str("false"),
            Revalidate::After(secs) => write!(f, "{secs}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRevalidate {
    Flag(bool),
    Seconds(u64),
}

impl<'de> Deserialize<'de> for Revalidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawRevalidate>::deserialize(deserializer)? {
            None | Some(RawRevalidate::Flag(_)) => Revalidate::Never,
            Some(RawRevalidate::Seconds(secs)) => Revalidate::After(secs),
        })
    }
}

impl Serialize for Revalidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Revalidate::Never => serializer.serialize_bool(false),
            Revalidate::After(secs) => serializer.serialize_u64(*secs),
        }
    }
}

/// What to do when a dynamic statically generated route has no artifact yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackMode {
    /// `false`: unknown paths are 404.
    None,
    /// Serve the prebuilt placeholder while the real page renders.
    Placeholder(String),
    /// `null`, `"blocking"` or absent: render before responding.
    #[default]
    Blocking,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFallback {
    Flag(bool),
    Path(String),
}

impl<'de> Deserialize<'de> for FallbackMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawFallback>::deserialize(deserializer)? {
            Some(RawFallback::Flag(false)) => FallbackMode::None,
            Some(RawFallback::Path(path)) if path != "blocking" => FallbackMode::Placeholder(path),
            None | Some(RawFallback::Flag(true)) | Some(RawFallback::Path(_)) => {
                FallbackMode::Blocking
            }
        })
    }
}

impl Serialize for FallbackMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FallbackMode::None => serializer.serialize_bool(false),
            FallbackMode::Placeholder(path) => serializer.serialize_str(path),
            FallbackMode::Blocking => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerenderRoute {
    #[serde(default)]
    pub initial_revalidate_seconds: Revalidate,
    #[serde(default)]
    pub src_route: Option<String>,
    #[serde(default)]
    pub data_route: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPrerenderRoute {
    #[serde(default)]
    pub route_regex: Option<String>,
    #[serde(default)]
    pub data_route: Option<String>,
    #[serde(default)]
    pub data_route_regex: Option<String>,
    #[serde(default)]
    pub fallback: FallbackMode,
}

/// Static generation metadata. `preview` is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerenderManifest {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub routes: OrderedMap<PrerenderRoute>,
    #[serde(default)]
    pub dynamic_routes: OrderedMap<DynamicPrerenderRoute>,
    #[serde(default)]
    pub not_found_routes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Build options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Deployment-level options that are not part of the framework's manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(default)]
    pub build_id: String,
    /// Alternate host → canonical origin (`www.example.com` → `https://example.com`).
    #[serde(default)]
    pub domain_redirects: HashMap<String, String>,
    #[serde(default)]
    pub trailing_slash: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Credentials>,
}

// ---------------------------------------------------------------------------
// Prepared manifests
// ---------------------------------------------------------------------------

/// How a page route is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageKind {
    /// Prebuilt HTML with no data dependency.
    Html { file: String },
    /// Rendered on every request.
    Ssr { page: String },
    /// Statically generated, possibly regenerated after `revalidate`.
    Ssg {
        page: Option<String>,
        file: String,
        revalidate: Revalidate,
        #[serde(rename = "dataRoute")]
        data_route: Option<String>,
    },
    /// Dynamic statically generated route rendered on first demand.
    SsgFallback { page: String, fallback: FallbackMode },
}

impl PageKind {
    /// The prebuilt file behind this route, if there is one.
    #[must_use]
    pub fn static_file(&self) -> Option<&str> {
        match self {
            PageKind::Html { file } | PageKind::Ssg { file, .. } => Some(file),
            PageKind::Ssr { .. } | PageKind::SsgFallback { .. } => None,
        }
    }

    /// The render entry point, if the route can be rendered.
    #[must_use]
    pub fn page(&self) -> Option<&str> {
        match self {
            PageKind::Ssr { page } | PageKind::SsgFallback { page, .. } => Some(page),
            PageKind::Ssg { page, .. } => page.as_deref(),
            PageKind::Html { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageManifest {
    pub build_id: String,
    pub non_dynamic: HashMap<String, PageKind>,
    /// Manifest order; the route table sorts by specificity on top of it.
    pub dynamic: Vec<(String, PageKind)>,
    /// Public file paths, each with a leading `/`.
    pub public_files: HashSet<String>,
}

/// API route → handler file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiManifest {
    pub non_dynamic: HashMap<String, String>,
    pub dynamic: Vec<(String, String)>,
}

/// Everything the resolver needs, loaded once per process.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildManifests {
    pub options: BuildOptions,
    pub routes: RoutesManifest,
    pub prerender: PrerenderManifest,
    pub pages: PageManifest,
    pub api: ApiManifest,
}
