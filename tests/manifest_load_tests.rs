use brrtedge::manifest::{load_build_options, load_manifests, FallbackMode, PageKind, Revalidate};
use brrtedge::resolver::{Request, Resolver, RouteResult};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ROUTES: &str = r#"{
  "version": 3,
  "basePath": "",
  "headers": [],
  "redirects": [
    { "source": "/old", "destination": "/new", "permanent": true }
  ],
  "rewrites": {
    "beforeFiles": [],
    "afterFiles": [{ "source": "/docs/:path*", "destination": "/blog/:path*" }],
    "fallback": []
  }
}"#;

const PAGES: &str = r#"{
  "/_app": "pages/_app.js",
  "/_document": "pages/_document.js",
  "/_error": "pages/_error.js",
  "/": "pages/index.js",
  "/404": "pages/404.html",
  "/about": "pages/about.html",
  "/blog/[slug]": "pages/blog/[slug].js",
  "/api/hello": "pages/api/hello.js"
}"#;

const PRERENDER: &str = r#"{
  "version": 3,
  "routes": {
    "/": { "initialRevalidateSeconds": 60, "srcRoute": null, "dataRoute": "/_next/data/abc123/index.json" }
  },
  "dynamicRoutes": {
    "/blog/[slug]": { "routeRegex": "^/blog/([^/]+?)(?:/)?$", "dataRoute": "/_next/data/abc123/blog/[slug].json", "dataRouteRegex": "unused", "fallback": null }
  },
  "notFoundRoutes": [],
  "preview": { "previewModeId": "id" }
}"#;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn build_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "routes-manifest.json", ROUTES);
    write(dir.path(), "pages-manifest.json", PAGES);
    write(dir.path(), "prerender-manifest.json", PRERENDER);
    dir
}

#[test]
fn test_loads_and_classifies_manifests() {
    let dir = build_dir();
    write(dir.path(), "BUILD_ID", "abc123\n");
    write(dir.path(), "public/favicon.ico", "icon");
    write(dir.path(), "public/images/logo.png", "png");

    let manifests = load_manifests(dir.path()).unwrap();

    assert_eq!(manifests.pages.build_id, "abc123");
    assert!(manifests.pages.public_files.contains("/favicon.ico"));
    assert!(manifests.pages.public_files.contains("/images/logo.png"));
    assert!(!manifests.pages.non_dynamic.contains_key("/_app"));
    assert_eq!(
        manifests.api.non_dynamic.get("/api/hello").map(String::as_str),
        Some("pages/api/hello.js")
    );
    assert_eq!(
        manifests.pages.non_dynamic.get("/"),
        Some(&PageKind::Ssg {
            page: Some("pages/index.js".into()),
            file: "pages/index.html".into(),
            revalidate: Revalidate::After(60),
            data_route: Some("/_next/data/abc123/index.json".into()),
        })
    );
    assert_eq!(
        manifests.pages.dynamic,
        vec![(
            "/blog/[slug]".to_string(),
            PageKind::SsgFallback {
                page: "pages/blog/[slug].js".into(),
                fallback: FallbackMode::Blocking,
            }
        )]
    );
    assert_eq!(manifests.routes.rewrites.len(), 1);
}

#[test]
fn test_loaded_manifests_drive_resolver() {
    let dir = build_dir();
    write(dir.path(), "build-options.yaml", "buildId: abc123\ntrailingSlash: false\n");
    let resolver = Resolver::new(load_manifests(dir.path()).unwrap()).unwrap();

    assert_eq!(
        resolver.route_default(&Request::new("/about")),
        RouteResult::static_file("pages/about.html")
    );
    assert_eq!(
        resolver.route_default(&Request::new("/old")),
        RouteResult::Redirect {
            status_code: 308,
            location: "/new".into()
        }
    );
    assert_eq!(
        resolver.route_default(&Request::new("/docs/hello")),
        RouteResult::static_file("pages/blog/hello.html")
    );
    assert_eq!(
        resolver.route_default(&Request::new("/_next/data/abc123/index.json")),
        RouteResult::Static {
            file: "/_next/data/abc123/index.json".into(),
            status_code: 200,
            is_data: true,
        }
    );
}

#[test]
fn test_public_files_list_wins_over_directory() {
    let dir = build_dir();
    write(dir.path(), "public-files.json", r#"["robots.txt"]"#);
    write(dir.path(), "public/favicon.ico", "icon");

    let manifests = load_manifests(dir.path()).unwrap();
    assert!(manifests.pages.public_files.contains("/robots.txt"));
    assert!(!manifests.pages.public_files.contains("/favicon.ico"));
}

#[test]
fn test_prerender_manifest_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "routes-manifest.json", ROUTES);
    write(dir.path(), "pages-manifest.json", PAGES);

    let manifests = load_manifests(dir.path()).unwrap();
    assert!(matches!(
        manifests.pages.non_dynamic.get("/"),
        Some(PageKind::Ssr { .. })
    ));
}

#[test]
fn test_missing_routes_manifest_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pages-manifest.json", PAGES);

    let err = load_manifests(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("routes-manifest.json"));
}

#[test]
fn test_malformed_manifest_is_an_error() {
    let dir = build_dir();
    write(dir.path(), "pages-manifest.json", "{ not json");

    let err = load_manifests(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("pages-manifest.json"));
}

#[test]
fn test_build_options_yaml_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("build-options.yaml");
    fs::write(
        &yaml,
        "buildId: b1\ndomainRedirects:\n  www.example.com: https://example.com\nauthentication:\n  username: user\n  password: pass\n",
    )
    .unwrap();
    let options = load_build_options(&yaml).unwrap();
    assert_eq!(options.build_id, "b1");
    assert_eq!(
        options.domain_redirects.get("www.example.com").map(String::as_str),
        Some("https://example.com")
    );
    assert_eq!(options.authentication.unwrap().username, "user");

    let json = dir.path().join("build-options.json");
    fs::write(&json, r#"{ "buildId": "b2", "trailingSlash": true }"#).unwrap();
    let options = load_build_options(&json).unwrap();
    assert_eq!(options.build_id, "b2");
    assert!(options.trailing_slash);
    assert!(options.authentication.is_none());
}
