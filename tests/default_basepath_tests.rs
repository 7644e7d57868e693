mod common;

use brrtedge::resolver::{Event, Request, Resolver, RouteResult};
use common::{fixtures, renderers};

fn resolver() -> Resolver {
    fixtures::resolver(fixtures::basepath_manifests())
}

fn static_file(result: &RouteResult) -> (&str, u16, bool) {
    match result {
        RouteResult::Static {
            file,
            status_code,
            is_data,
        } => (file.as_str(), *status_code, *is_data),
        other => panic!("expected Static, got {other:?}"),
    }
}

#[test]
fn test_public_files() {
    let resolver = resolver();
    let cases = [
        ("/base/favicon.ico", "/favicon.ico"),
        ("/base/name%20with%20spaces.txt", "/name%20with%20spaces.txt"),
    ];
    for (uri, file) in cases {
        match resolver.route_default(&Request::new(uri)) {
            RouteResult::PublicFile { file: got } => assert_eq!(got, file, "uri {uri}"),
            other => panic!("{uri}: expected PublicFile, got {other:?}"),
        }
    }
}

#[test]
fn test_non_dynamic_static_pages() {
    let resolver = resolver();
    let cases = [
        ("/base", "pages/index.html", 200),
        ("/base/ssg", "pages/ssg.html", 200),
        ("/base/fallback/prerendered", "pages/fallback/prerendered.html", 200),
        ("/base/not/found", "pages/404.html", 404),
    ];
    for (uri, file, status) in cases {
        let result = resolver.route_default(&Request::new(uri));
        assert_eq!(static_file(&result), (file, status, false), "uri {uri}");
    }
}

#[test]
fn test_path_outside_base_path_resolves_unprefixed() {
    let resolver = resolver();
    let result = resolver.route_default(&Request::new("/ssg"));
    assert_eq!(static_file(&result), ("pages/ssg.html", 200, false));
}

#[test]
fn test_static_data_routes() {
    let resolver = resolver();
    let cases = [
        (
            "/base/_next/data/test-build-id/ssg.json",
            "/_next/data/test-build-id/ssg.json",
        ),
        (
            "/base/_next/data/test-build-id/fallback/new.json",
            "/_next/data/test-build-id/fallback/new.json",
        ),
    ];
    for (uri, file) in cases {
        let result = resolver.route_default(&Request::new(uri));
        assert_eq!(static_file(&result), (file, 200, true), "uri {uri}");
    }
}

#[test]
fn test_unknown_data_route_is_not_found() {
    let resolver = resolver();
    let result = resolver.route_default(&Request::new(
        "/base/_next/data/test-build-id/does/not/exist.json",
    ));
    assert_eq!(static_file(&result), ("pages/404.html", 404, true));
}

#[test]
fn test_dynamic_static_pages() {
    let resolver = resolver();
    let cases = [
        ("/base/foo", "pages/[root].html"),
        ("/base/html/bar", "pages/html/[page].html"),
        ("/base/fallback/new", "pages/fallback/new.html"),
    ];
    for (uri, file) in cases {
        let result = resolver.route_default(&Request::new(uri));
        assert_eq!(static_file(&result), (file, 200, false), "uri {uri}");
    }
}

#[test]
fn test_ssr_routes_render() {
    let resolver = resolver();
    let cases = [
        ("/base/ssr", "pages/ssr.js", None, false),
        ("/base/_next/data/test-build-id/ssr.json", "pages/ssr.js", None, true),
        ("/base/ssr/1", "pages/ssr/[id].js", Some("1"), false),
        (
            "/base/_next/data/test-build-id/ssr/1.json",
            "pages/ssr/[id].js",
            Some("1"),
            true,
        ),
    ];
    for (uri, expected_page, id, expected_data) in cases {
        match resolver.route_default(&Request::new(uri)) {
            RouteResult::Render {
                page,
                params,
                is_data,
                ..
            } => {
                assert_eq!(page, expected_page, "uri {uri}");
                assert_eq!(params.get_str("id"), id, "uri {uri}");
                assert_eq!(is_data, expected_data, "uri {uri}");
            }
            other => panic!("{uri}: expected Render, got {other:?}"),
        }
    }
}

#[test]
fn test_failed_render_serves_error_page() {
    let resolver = resolver();
    for uri in [
        "/base/ssr",
        "/base/_next/data/test-build-id/ssr.json",
        "/base/ssr/1",
        "/base/_next/data/test-build-id/ssr/1.json",
    ] {
        let mut event = Event::new(Request::new(uri));
        let result = resolver.handle_default(&mut event, &renderers::failing);
        assert_eq!(static_file(&result), ("pages/500.html", 500, false), "uri {uri}");
        assert_eq!(event.response.status(), 500);
        assert!(!event.response.is_ended());
    }
}

#[test]
fn test_redirects() {
    let resolver = resolver();
    let cases = [
        ("/base/ssg/", 308, "/base/ssg"),
        ("/base/favicon.ico/", 308, "/base/favicon.ico"),
        ("/base/redirect-simple", 307, "/base/redirect-target"),
        ("/base/redirect/test", 308, "/base/redirect-target/test"),
    ];
    for (uri, code, destination) in cases {
        let mut event = Event::new(Request::new(uri));
        let result = resolver.handle_default(&mut event, &renderers::rendered_page);

        assert_eq!(
            result,
            RouteResult::Redirect {
                status_code: code,
                location: destination.to_string()
            },
            "uri {uri}"
        );
        assert_eq!(event.response.status(), code);
        assert_eq!(event.response.header("location"), Some(destination));
        assert!(event.response.is_ended());
    }
}

#[test]
fn test_trailing_slash_keeps_query() {
    let resolver = resolver();
    let result = resolver.route_default(&Request::new("/base/ssg/?a=1"));
    assert_eq!(
        result,
        RouteResult::Redirect {
            status_code: 308,
            location: "/base/ssg?a=1".to_string()
        }
    );
}

#[test]
fn test_trailing_slash_enabled_resolves_slash_form() {
    let mut manifests = fixtures::basepath_manifests();
    manifests.options.trailing_slash = true;
    let resolver = fixtures::resolver(manifests);

    assert_eq!(
        resolver.route_default(&Request::new("/base/ssg")),
        RouteResult::Redirect {
            status_code: 308,
            location: "/base/ssg/".to_string()
        }
    );

    let cases = [
        ("/base/", "pages/index.html"),
        ("/base/ssg/", "pages/ssg.html"),
        ("/base/html/bar/", "pages/html/[page].html"),
        ("/base/fallback/new/", "pages/fallback/new.html"),
    ];
    for (uri, file) in cases {
        let result = resolver.route_default(&Request::new(uri));
        assert_eq!(static_file(&result), (file, 200, false), "uri {uri}");
    }

    match resolver.route_default(&Request::new("/base/ssr/1/")) {
        RouteResult::Render { page, params, .. } => {
            assert_eq!(page, "pages/ssr/[id].js");
            assert_eq!(params.get_str("id"), Some("1"));
        }
        other => panic!("expected Render, got {other:?}"),
    }
}

fn rewriting_resolver() -> Resolver {
    let mut manifests = fixtures::basepath_manifests();
    manifests.routes = fixtures::routes(serde_json::json!({
        "basePath": "/base",
        "headers": [
            { "source": "/base/:path*", "headers": [{ "key": "x-frame-options", "value": "DENY" }] }
        ],
        "redirects": [
            { "source": "/base/redirect-simple", "destination": "/base/redirect-target", "statusCode": 307 }
        ],
        "rewrites": [
            { "source": "/base/old/:id", "destination": "/base/ssr/:id?x=1" },
            { "source": "/base/proxy/:path*", "destination": "https://backend.example.com/:path*" },
            { "source": "/base/ftp", "destination": "ftp://example.com" },
            { "source": "/base/ftp", "destination": "/base/ssg" },
            { "source": "/base/ftp-only", "destination": "ftp://example.com" }
        ]
    }));
    fixtures::resolver(manifests)
}

#[test]
fn test_internal_rewrite_merges_query() {
    let resolver = rewriting_resolver();

    let cases = [("/base/old/5", "x=1"), ("/base/old/5?a=2", "a=2&x=1")];
    for (uri, expected_query) in cases {
        match resolver.route_default(&Request::new(uri)) {
            RouteResult::Render {
                page,
                params,
                querystring,
                ..
            } => {
                assert_eq!(page, "pages/ssr/[id].js", "uri {uri}");
                assert_eq!(params.get_str("id"), Some("5"), "uri {uri}");
                assert_eq!(querystring.as_deref(), Some(expected_query), "uri {uri}");
            }
            other => panic!("{uri}: expected Render, got {other:?}"),
        }
    }
}

#[test]
fn test_external_rewrite_in_page_flow() {
    let resolver = rewriting_resolver();
    assert_eq!(
        resolver.route_default(&Request::new("/base/proxy/a/b")),
        RouteResult::External {
            url: "https://backend.example.com/a/b".to_string()
        }
    );
}

#[test]
fn test_invalid_rewrite_scheme_falls_through() {
    let resolver = rewriting_resolver();

    let result = resolver.route_default(&Request::new("/base/ftp"));
    assert_eq!(static_file(&result), ("pages/ssg.html", 200, false));

    let result = resolver.route_default(&Request::new("/base/ftp-only"));
    assert_eq!(static_file(&result), ("pages/[root].html", 200, false));
}

#[test]
fn test_header_rules_stay_on_terminal_outcomes() {
    let resolver = rewriting_resolver();

    let mut event = Event::new(Request::new("/base/redirect-simple"));
    resolver.handle_default(&mut event, &renderers::rendered_page);
    assert_eq!(event.response.status(), 307);
    assert_eq!(event.response.header("location"), Some("/base/redirect-target"));
    assert_eq!(event.response.header("x-frame-options"), Some("DENY"));

    let mut event = Event::new(Request::new("/base/not/found"));
    let result = resolver.handle_default(&mut event, &renderers::rendered_page);
    assert_eq!(static_file(&result), ("pages/404.html", 404, false));
    assert_eq!(event.response.status(), 404);
    assert_eq!(event.response.header("x-frame-options"), Some("DENY"));
}
