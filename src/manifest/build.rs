use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::types::{
    ApiManifest, BuildManifests, BuildOptions, OrderedMap, PageKind, PageManifest,
    PrerenderManifest, RoutesManifest,
};
use crate::router::is_dynamic_route;

/// Framework-internal pages that are never routed directly.
const INTERNAL_PAGES: [&str; 3] = ["/_app", "/_document", "/_error"];

fn is_api_route(route: &str) -> bool {
    route == "/api" || route.starts_with("/api/")
}

/// File served for a statically generated route (`/` → `pages/index.html`).
#[must_use]
pub fn static_page_file(route: &str) -> String {
    if route == "/" {
        "pages/index.html".to_string()
    } else {
        format!("pages{route}.html")
    }
}

/// Classify every page-manifest entry and split pages from API handlers.
///
/// `pages_manifest` maps route → built file in manifest order; `public_files`
/// are paths relative to the public directory, with or without a leading `/`.
#[must_use]
pub fn prepare_build_manifests(
    options: BuildOptions,
    routes: RoutesManifest,
    pages_manifest: &OrderedMap<String>,
    prerender: PrerenderManifest,
    public_files: &[String],
) -> BuildManifests {
    let mut non_dynamic: HashMap<String, PageKind> = HashMap::new();
    let mut dynamic: Vec<(String, PageKind)> = Vec::new();
    let mut api = ApiManifest::default();

    for (route, file) in pages_manifest.iter() {
        if INTERNAL_PAGES.contains(&route) {
            continue;
        }

        if is_api_route(route) {
            if is_dynamic_route(route) {
                api.dynamic.push((route.to_string(), file.clone()));
            } else {
                api.non_dynamic.insert(route.to_string(), file.clone());
            }
            continue;
        }

        let kind = if file.ends_with(".html") {
            PageKind::Html { file: file.clone() }
        } else if let Some(ssg) = prerender.routes.get(route) {
            PageKind::Ssg {
                page: Some(file.clone()),
                file: static_page_file(route),
                revalidate: ssg.initial_revalidate_seconds,
                data_route: ssg.data_route.clone(),
            }
        } else if let Some(fallback) = prerender.dynamic_routes.get(route) {
            PageKind::SsgFallback {
                page: file.clone(),
                fallback: fallback.fallback.clone(),
            }
        } else {
            PageKind::Ssr { page: file.clone() }
        };

        debug!(route = %route, kind = ?kind, "Classified page");
        if is_dynamic_route(route) {
            dynamic.push((route.to_string(), kind));
        } else {
            non_dynamic.insert(route.to_string(), kind);
        }
    }

    // Concrete paths prerendered for dynamic routes have no pages-manifest
    // entry of their own.
    for (route, ssg) in prerender.routes.iter() {
        if non_dynamic.contains_key(route) {
            continue;
        }
        let src = ssg.src_route.as_deref().unwrap_or(route);
        non_dynamic.insert(
            route.to_string(),
            PageKind::Ssg {
                page: pages_manifest.get(src).cloned(),
                file: static_page_file(route),
                revalidate: ssg.initial_revalidate_seconds,
                data_route: ssg.data_route.clone(),
            },
        );
    }

    let public_files: HashSet<String> = public_files
        .iter()
        .map(|f| format!("/{}", f.trim_start_matches('/')))
        .collect();

    info!(
        build_id = %options.build_id,
        pages = non_dynamic.len() + dynamic.len(),
        api_routes = api.non_dynamic.len() + api.dynamic.len(),
        public_files = public_files.len(),
        "Build manifests prepared"
    );

    BuildManifests {
        pages: PageManifest {
            build_id: options.build_id.clone(),
            non_dynamic,
            dynamic,
            public_files,
        },
        api,
        options,
        routes,
        prerender,
    }
}
