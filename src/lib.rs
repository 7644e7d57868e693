//! # brrtedge
//!
//! **brrtedge** is the request-routing core of a CDN edge function serving a
//! statically exported, partly server-rendered web application. It is driven
//! entirely by the build manifests the application's build step emits.
//!
//! ## Overview
//!
//! For each incoming request the edge decides, with a fixed precedence, to
//! redirect, rewrite, serve a prebuilt file, render a page on demand, invoke
//! an API handler, or answer 404. Behind the edge cache it also runs the
//! incremental regeneration flow: misses are rendered and persisted, stale
//! objects get a short `s-maxage` so the next request refetches them.
//!
//! ## Architecture
//!
//! - **[`manifest`]** - build manifest types, preparation and loading
//! - **[`router`]** - path patterns (`/blog/[slug]`, `/:path*`) and compiled route tables
//! - **[`rules`]** - header rules, redirects and rewrites from the routes manifest
//! - **[`resolver`]** - the page and API handlers producing a [`resolver::RouteResult`]
//! - **[`render`]** - the page renderer collaborator
//! - **[`store`]** - the artifact store collaborator (memory and filesystem)
//! - **[`regeneration`]** - cache-control policy and the origin-response flow
//! - **[`runtime_config`]** / **[`logging`]** - environment-driven settings
//! - **[`cli`]** - the `brrtedge` binary
//!
//! ### Request Resolution Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Edge as Edge function
//!     participant Loader as manifest::load_manifests
//!     participant Resolver
//!     participant Manager as RegenerationManager
//!     participant Store as ArtifactStore
//!
//!     Edge->>Loader: load once per cold start
//!     Loader-->>Edge: BuildManifests
//!     Edge->>Resolver: Resolver::new(manifests)
//!
//!     Edge->>Resolver: handle_default(event, renderer)
//!     Resolver-->>Edge: RouteResult
//!     alt Static
//!         Edge->>Edge: fetch file from origin
//!         Edge->>Manager: handle_origin_response(request, origin)
//!         alt miss
//!             Manager->>Store: put data then HTML
//!         end
//!         Manager-->>Edge: response + state
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtedge::manifest::{
//!     prepare_build_manifests, BuildOptions, OrderedMap, PrerenderManifest, RoutesManifest,
//! };
//! use brrtedge::resolver::{Request, Resolver, RouteResult};
//!
//! let pages: OrderedMap<String> = [
//!     ("/", "pages/index.js"),
//!     ("/blog/[slug]", "pages/blog/[slug].js"),
//! ]
//! .into_iter()
//! .map(|(route, file)| (route, file.to_string()))
//! .collect();
//!
//! let manifests = prepare_build_manifests(
//!     BuildOptions {
//!         build_id: "build-id".into(),
//!         ..BuildOptions::default()
//!     },
//!     RoutesManifest::default(),
//!     &pages,
//!     PrerenderManifest::default(),
//!     &[],
//! );
//! let resolver = Resolver::new(manifests)?;
//!
//! match resolver.route_default(&Request::new("/blog/hello")) {
//!     RouteResult::Render { page, params, .. } => {
//!         assert_eq!(page, "pages/blog/[slug].js");
//!         assert_eq!(params.get_str("slug"), Some("hello"));
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok::<(), brrtedge::router::PatternError>(())
//! ```
//!
//! ## Configuration
//!
//! Build options (`build-options.yaml` or `.json` next to the manifests):
//!
//! ```yaml
//! buildId: 4rTz2cD9
//! trailingSlash: false
//! domainRedirects:
//!   example.com: https://www.example.com
//! authentication:
//!   username: preview
//!   password: s3cret
//! ```
//!
//! Runtime settings come from `BRRTE_*` environment variables, see
//! [`runtime_config`] and [`logging`].

pub mod cli;
pub mod logging;
pub mod manifest;
pub mod regeneration;
pub mod render;
pub mod resolver;
pub mod router;
pub mod rules;
pub mod runtime_config;
pub mod store;

pub use manifest::{load_manifests, prepare_build_manifests, BuildManifests};
pub use regeneration::{CachePolicy, RegenerationManager};
pub use render::PageRenderer;
pub use resolver::{Event, Request, Resolver, Response, RouteResult};
pub use store::ArtifactStore;
