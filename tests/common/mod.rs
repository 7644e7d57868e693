#![allow(dead_code)]

use brrtedge::manifest::{
    prepare_build_manifests, BuildManifests, BuildOptions, OrderedMap, PrerenderManifest,
    RoutesManifest,
};
use brrtedge::render::{RenderError, RenderRequest, RenderedPage};
use brrtedge::resolver::Resolver;
use serde_json::json;

pub mod fixtures {
    use super::*;

    pub fn pages(entries: &[(&str, &str)]) -> OrderedMap<String> {
        entries
            .iter()
            .map(|(route, file)| (*route, (*file).to_string()))
            .collect()
    }

    pub fn prerender(value: serde_json::Value) -> PrerenderManifest {
        serde_json::from_value(value).unwrap()
    }

    pub fn routes(value: serde_json::Value) -> RoutesManifest {
        serde_json::from_value(value).unwrap()
    }

    pub fn build(
        options: BuildOptions,
        routes: RoutesManifest,
        pages: &OrderedMap<String>,
        prerender: PrerenderManifest,
        public_files: &[&str],
    ) -> BuildManifests {
        let public_files: Vec<String> = public_files.iter().map(|f| (*f).to_string()).collect();
        prepare_build_manifests(options, routes, pages, prerender, &public_files)
    }

    pub fn options(build_id: &str) -> BuildOptions {
        BuildOptions {
            build_id: build_id.to_string(),
            ..BuildOptions::default()
        }
    }

    /// Site deployed under `/base` with SSG, SSR, fallback and HTML pages.
    pub fn basepath_manifests() -> BuildManifests {
        let prerender = prerender(json!({
            "version": 3,
            "notFoundRoutes": [],
            "routes": {
                "/ssg": { "initialRevalidateSeconds": false, "srcRoute": null, "dataRoute": "unused" },
                "/fallback/prerendered": { "initialRevalidateSeconds": false, "srcRoute": null, "dataRoute": "unused" }
            },
            "dynamicRoutes": {
                "/fallback/[slug]": {
                    "routeRegex": "unused",
                    "dataRoute": "unused",
                    "dataRouteRegex": "unused",
                    "fallback": "/fallback/[slug].html"
                }
            },
            "preview": {
                "previewModeId": "test-id",
                "previewModeEncryptionKey": "test-key",
                "previewModeSigningKey": "test-sig-key"
            }
        }));
        let routes = routes(json!({
            "basePath": "/base",
            "headers": [],
            "redirects": [
                { "source": "/base/redirect-simple", "destination": "/base/redirect-target", "statusCode": 307 },
                { "source": "/base/redirect/:dynamic", "destination": "/base/redirect-target/:dynamic", "statusCode": 308 }
            ],
            "rewrites": []
        }));
        let pages = pages(&[
            ("/", "pages/index.html"),
            ("/404", "pages/404.html"),
            ("/500", "pages/500.html"),
            ("/[root]", "pages/[root].html"),
            ("/html/[page]", "pages/html/[page].html"),
            ("/ssr", "pages/ssr.js"),
            ("/ssr/[id]", "pages/ssr/[id].js"),
            ("/ssg", "pages/ssg.js"),
            ("/fallback/[slug]", "pages/fallback/[slug].js"),
        ]);
        build(
            options("test-build-id"),
            routes,
            &pages,
            prerender,
            &["favicon.ico", "name with spaces.txt"],
        )
    }

    /// API routes with header rules, redirects and a domain redirect.
    pub fn api_manifests() -> BuildManifests {
        let routes = routes(json!({
            "basePath": "",
            "headers": [
                { "source": "/api/static", "headers": [{ "key": "X-Test-Header", "value": "value" }] }
            ],
            "redirects": [
                { "source": "/api/redirect-simple", "destination": "/api/static", "statusCode": 307 },
                { "source": "/redirect/:dynamic", "destination": "/api/dynamic/:dynamic", "statusCode": 308 },
                { "source": "/api/redirect-query", "destination": "/api/static?foo=bar", "statusCode": 307 }
            ],
            "rewrites": [
                { "source": "/api/legacy/:id", "destination": "/api/dynamic/:id" },
                { "source": "/api/proxy", "destination": "https://backend.example.com/api" }
            ]
        }));
        let pages = pages(&[
            ("/", "pages/index.html"),
            ("/404", "pages/404.html"),
            ("/500", "pages/500.html"),
            ("/api", "pages/api/index.js"),
            ("/api/static", "pages/api/static.js"),
            ("/api/dynamic/[id]", "pages/api/dynamic/[id].js"),
        ]);
        let mut options = options("test-build-id");
        options
            .domain_redirects
            .insert("www.example.com".into(), "https://example.com".into());
        build(
            options,
            routes,
            &pages,
            PrerenderManifest::default(),
            &["favicon.ico", "name with spaces.txt"],
        )
    }

    /// Build `build-id` with every fallback mode, as seen by the origin.
    pub fn origin_manifests() -> BuildManifests {
        let prerender = prerender(json!({
            "version": 3,
            "routes": {
                "/": { "initialRevalidateSeconds": false, "srcRoute": null, "dataRoute": "/_next/data/build-id/index.json" },
                "/fallback/prerendered": { "initialRevalidateSeconds": false, "srcRoute": "/fallback/[slug]", "dataRoute": "/_next/data/build-id/fallback/prerendered.json" },
                "/revalidating": { "initialRevalidateSeconds": 60, "srcRoute": null, "dataRoute": "/_next/data/build-id/revalidating.json" }
            },
            "dynamicRoutes": {
                "/fallback-blocking/[slug]": { "fallback": null },
                "/fallback/[slug]": { "fallback": "/fallback/[slug].html" },
                "/tests/prerender-manifest-fallback/[fallback]": {
                    "fallback": "/tests/prerender-manifest-fallback/[fallback].html"
                },
                "/tests/prerender-manifest/[staticPageName]": { "fallback": false }
            },
            "notFoundRoutes": []
        }));
        let pages = pages(&[
            ("/", "pages/index.js"),
            ("/404", "pages/404.html"),
            ("/revalidating", "pages/revalidating.js"),
            ("/fallback-blocking/[slug]", "pages/fallback-blocking/[slug].js"),
            ("/fallback/[slug]", "pages/fallback/[slug].js"),
            (
                "/tests/prerender-manifest-fallback/[fallback]",
                "pages/tests/prerender-manifest-fallback/[fallback].js",
            ),
            (
                "/tests/prerender-manifest/[staticPageName]",
                "pages/tests/prerender-manifest/[staticPageName].js",
            ),
            ("/customers/[customer]", "pages/customers/[customer].js"),
        ]);
        build(
            options("build-id"),
            RoutesManifest::default(),
            &pages,
            prerender,
            &[],
        )
    }

    pub fn resolver(manifests: BuildManifests) -> Resolver {
        Resolver::new(manifests).unwrap()
    }
}

pub mod renderers {
    use super::*;

    /// Every render fails, like a page module that throws.
    pub fn failing(page: &str, _request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        Err(RenderError::failed(page, "render threw"))
    }

    /// Renders `<div>Rendered Page</div>` with `{"page": page}` as its data.
    pub fn rendered_page(page: &str, _request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        Ok(RenderedPage::new(
            "<div>Rendered Page</div>",
            json!({ "page": page }),
        ))
    }
}
