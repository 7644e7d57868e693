//! # Manifest Module
//!
//! Typed, immutable view over a site's build output.
//!
//! ## Overview
//!
//! A build produces several JSON documents describing every route the site
//! exposes. This module deserializes them and classifies each page:
//!
//! - **Routes manifest** - base path plus ordered header, redirect and rewrite rules
//! - **Pages manifest** - route → built file, split into pages and API handlers
//! - **Prerender manifest** - revalidation windows and fallback modes
//! - **Public files** - paths served verbatim
//! - **Build options** - build id, domain redirects, trailing slash, basic auth
//!
//! ## Loading
//!
//! ```rust,no_run
//! use brrtedge::manifest::load_manifests;
//!
//! let manifests = load_manifests(".serverless_nextjs")?;
//! println!("build {}", manifests.pages.build_id);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Manifests are loaded once. Shape errors fail the load and are never a
//! per-request concern.

mod build;
mod load;
mod types;


pub use build::{prepare_build_manifests, static_page_file};
pub use load::{load_build_options, load_manifests};
pub use types::{
    ApiManifest, BuildManifests, BuildOptions, Credentials, DynamicPrerenderRoute, FallbackMode,
    HeaderEntry, HeaderRule, OrderedMap, PageKind, PageManifest, PrerenderManifest,
    PrerenderRoute, RedirectRule, Revalidate, RewriteRule, RoutesManifest,
};
