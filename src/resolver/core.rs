//! Resolver core - request classification for the page and API flows.
//!
//! Both flows share one preamble (basic auth, domain redirect, trailing
//! slash, configured redirects) and then walk their own precedence list.
//! `route_*` are pure; `handle_*` also write terminal outcomes to the
//! response.

use base64::{engine::general_purpose, Engine as _};
use http::header;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{Event, Request, RouteResult};
use crate::manifest::{static_page_file, BuildManifests, PageKind};
use crate::render::{PageRenderer, RenderRequest};
use crate::router::{Params, PatternError, RouteTable};
use crate::rules::{
    domain_redirect, is_external_rewrite, trailing_slash_redirect, CompiledRules,
};

const DATA_ROUTE_PREFIX: &str = "/_next/data/";
const DEFAULT_NOT_FOUND_FILE: &str = "pages/404.html";
const DEFAULT_ERROR_FILE: &str = "pages/500.html";

#[derive(Debug)]
struct Compiled {
    manifests: BuildManifests,
    pages: RouteTable<PageKind>,
    api: RouteTable<String>,
    rules: CompiledRules,
    expected_authorization: Option<String>,
    data_prefix: String,
    not_found_file: String,
    error_file: String,
}

/// Route resolver over one immutable manifest snapshot.
///
/// Cloning is cheap; clones share the compiled tables.
#[derive(Debug, Clone)]
pub struct Resolver {
    inner: Arc<Compiled>,
}

fn split_query(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
        None => (target, None),
    }
}

/// Drop one trailing slash; `/` is kept.
fn without_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

fn merge_query(first: Option<&str>, second: Option<&str>) -> Option<String> {
    let merged = first
        .into_iter()
        .chain(second)
        .filter(|q| !q.is_empty())
        .collect::<Vec<_>>()
        .join("&");
    Some(merged).filter(|q| !q.is_empty())
}

impl Resolver {
    /// Compile every page, API and rule pattern of `manifests`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for the first pattern that does not compile.
    pub fn new(manifests: BuildManifests) -> Result<Self, PatternError> {
        let pages = RouteTable::new(
            manifests
                .pages
                .non_dynamic
                .iter()
                .map(|(route, kind)| (route.clone(), kind.clone()))
                .chain(manifests.pages.dynamic.iter().cloned()),
        )?;
        let api = RouteTable::new(
            manifests
                .api
                .non_dynamic
                .iter()
                .map(|(route, page)| (route.clone(), page.clone()))
                .chain(manifests.api.dynamic.iter().cloned()),
        )?;
        let rules = CompiledRules::compile(&manifests.routes)?;

        let expected_authorization = manifests.options.authentication.as_ref().map(|creds| {
            format!(
                "Basic {}",
                general_purpose::STANDARD.encode(format!("{}:{}", creds.username, creds.password))
            )
        });

        let special_file = |route: &str, default: &str| {
            pages
                .literal(route)
                .and_then(PageKind::static_file)
                .unwrap_or(default)
                .to_string()
        };
        let not_found_file = special_file("/404", DEFAULT_NOT_FOUND_FILE);
        let error_file = special_file("/500", DEFAULT_ERROR_FILE);

        let data_prefix = format!("{DATA_ROUTE_PREFIX}{}/", manifests.pages.build_id);

        info!(
            base_path = %manifests.routes.base_path,
            build_id = %manifests.pages.build_id,
            pages = pages.len(),
            api_routes = api.len(),
            redirects = rules.redirects.len(),
            rewrites = rules.rewrites.len(),
            header_rules = rules.headers.len(),
            "Resolver ready"
        );

        Ok(Self {
            inner: Arc::new(Compiled {
                manifests,
                pages,
                api,
                rules,
                expected_authorization,
                data_prefix,
                not_found_file,
                error_file,
            }),
        })
    }

    #[must_use]
    pub fn manifests(&self) -> &BuildManifests {
        &self.inner.manifests
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.inner.manifests.routes.base_path
    }

    #[must_use]
    pub fn build_id(&self) -> &str {
        &self.inner.manifests.pages.build_id
    }

    #[must_use]
    pub fn page_routes(&self) -> &RouteTable<PageKind> {
        &self.inner.pages
    }

    #[must_use]
    pub fn api_routes(&self) -> &RouteTable<String> {
        &self.inner.api
    }

    #[must_use]
    pub fn not_found_file(&self) -> &str {
        &self.inner.not_found_file
    }

    /// Strip the base path. Paths outside the base path are returned as-is.
    #[must_use]
    pub fn normalise<'a>(&self, uri: &'a str) -> &'a str {
        let base = self.base_path();
        if base.is_empty() {
            return uri;
        }
        if uri == base {
            return "/";
        }
        match uri.strip_prefix(base) {
            Some(rest) if rest.starts_with('/') => rest,
            _ => uri,
        }
    }

    /// Base-stripped path without a trailing slash, as held by the route
    /// tables.
    #[must_use]
    pub fn lookup_path<'a>(&self, uri: &'a str) -> &'a str {
        without_trailing_slash(self.normalise(without_trailing_slash(uri)))
    }

    /// Page path behind a data route (`/_next/data/<id>/a/b.json` → `/a/b`).
    #[must_use]
    pub fn data_page_path(&self, path: &str) -> Option<String> {
        let rest = path
            .strip_prefix(self.inner.data_prefix.as_str())?
            .strip_suffix(".json")?;
        if rest.is_empty() {
            return None;
        }
        Some(if rest == "index" {
            "/".to_string()
        } else {
            format!("/{rest}")
        })
    }

    /// Page route for a concrete (base-stripped) path.
    #[must_use]
    pub fn find_page(&self, path: &str) -> Option<(&PageKind, Params)> {
        self.inner.pages.route(path)
    }

    fn authorized(&self, request: &Request) -> bool {
        match &self.inner.expected_authorization {
            None => true,
            Some(expected) => request.header(header::AUTHORIZATION) == Some(expected.as_str()),
        }
    }

    /// Stages shared by both flows. `Some` is terminal.
    fn preamble(&self, request: &Request) -> Option<RouteResult> {
        let uri = request.uri.as_str();
        let query = request.querystring.as_deref();
        let options = &self.inner.manifests.options;

        if !self.authorized(request) {
            debug!(uri = %uri, "Basic auth rejected");
            return Some(RouteResult::Unauthorized);
        }

        if let Some(redirect) =
            domain_redirect(&options.domain_redirects, request.host(), uri, query)
        {
            return Some(redirect.into());
        }

        let is_data = self.normalise(uri).starts_with(DATA_ROUTE_PREFIX);
        if !is_data {
            if let Some(redirect) = trailing_slash_redirect(uri, query, options.trailing_slash) {
                return Some(redirect.into());
            }
        }

        self.inner
            .rules
            .redirects
            .resolve(uri, query)
            .map(RouteResult::from)
    }

    fn not_found(&self, is_data: bool) -> RouteResult {
        RouteResult::Static {
            file: self.inner.not_found_file.clone(),
            status_code: 404,
            is_data,
        }
    }

    fn page_result(
        &self,
        kind: &PageKind,
        path: &str,
        params: Params,
        querystring: Option<String>,
    ) -> RouteResult {
        match kind {
            PageKind::Html { file } | PageKind::Ssg { file, .. } => RouteResult::static_file(file),
            PageKind::SsgFallback { .. } => RouteResult::static_file(static_page_file(path)),
            PageKind::Ssr { page } => RouteResult::Render {
                page: page.clone(),
                params,
                is_data: false,
                querystring,
            },
        }
    }

    /// Literal pages, then one rewrite, then dynamic pages.
    fn route_page(
        &self,
        path: &str,
        querystring: Option<String>,
        rewrite_from: Option<&str>,
    ) -> RouteResult {
        let pages = &self.inner.pages;

        if let Some(kind) = pages.literal(path) {
            return self.page_result(kind, path, Params::new(), querystring);
        }

        if let Some(uri) = rewrite_from {
            if let Some(target) = self.inner.rules.rewrites.resolve(uri) {
                if is_external_rewrite(&target) {
                    return RouteResult::External { url: target };
                }
                let (target_path, target_query) = split_query(&target);
                let querystring = merge_query(querystring.as_deref(), target_query);
                return self.route_page(self.lookup_path(target_path), querystring, None);
            }
        }

        if let Some(matched) = pages.dynamic(path) {
            return self.page_result(matched.target, path, matched.params, querystring);
        }

        self.not_found(false)
    }

    fn route_data(&self, path: &str, page_path: &str, querystring: Option<String>) -> RouteResult {
        match self.find_page(page_path) {
            Some((PageKind::Ssg { .. } | PageKind::SsgFallback { .. }, _)) => RouteResult::Static {
                file: path.to_string(),
                status_code: 200,
                is_data: true,
            },
            Some((PageKind::Ssr { page }, params)) => RouteResult::Render {
                page: page.clone(),
                params,
                is_data: true,
                querystring,
            },
            Some((PageKind::Html { .. }, _)) | None => self.not_found(true),
        }
    }

    /// Classify a page request.
    #[must_use]
    pub fn route_default(&self, request: &Request) -> RouteResult {
        if let Some(result) = self.preamble(request) {
            return result;
        }

        // Route tables hold slash-less routes.
        let uri = without_trailing_slash(&request.uri);
        let path = self.lookup_path(uri);
        let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        if self.inner.manifests.pages.public_files.contains(decoded.as_ref()) {
            return RouteResult::PublicFile {
                file: path.to_string(),
            };
        }

        if let Some(page_path) = self.data_page_path(path) {
            return self.route_data(path, &page_path, request.querystring.clone());
        }

        let result = self.route_page(path, request.querystring.clone(), Some(uri));
        if matches!(result, RouteResult::Static { status_code: 404, .. }) {
            debug!(uri = %request.uri, "No route matched");
        }
        result
    }

    /// Classify an API request.
    #[must_use]
    pub fn route_api(&self, request: &Request) -> RouteResult {
        if let Some(result) = self.preamble(request) {
            return result;
        }

        let api = &self.inner.api;
        let uri = without_trailing_slash(&request.uri);
        let path = self.lookup_path(uri);
        let invoke = |page: &String, params: Params, querystring: Option<String>| {
            RouteResult::ApiInvoke {
                page: page.clone(),
                params,
                querystring,
            }
        };

        if let Some(page) = api.literal(path) {
            return invoke(page, Params::new(), request.querystring.clone());
        }

        if let Some(target) = self.inner.rules.rewrites.resolve(uri) {
            if is_external_rewrite(&target) {
                return RouteResult::External { url: target };
            }
            let (target_path, target_query) = split_query(&target);
            let querystring = merge_query(request.querystring.as_deref(), target_query);
            return match api.route(self.lookup_path(target_path)) {
                Some((page, params)) => invoke(page, params, querystring),
                None => RouteResult::NotFound,
            };
        }

        if let Some(matched) = api.dynamic(path) {
            return invoke(matched.target, matched.params, request.querystring.clone());
        }

        debug!(uri = %request.uri, "No API route matched");
        RouteResult::NotFound
    }

    /// Attach every matching header rule to the response.
    fn apply_headers(&self, event: &mut Event) {
        for (name, value) in self.inner.rules.headers.matching(&event.request.uri) {
            event.response.set_header(name, value);
        }
    }

    /// Resolve a page request and act on it.
    ///
    /// Redirects and auth challenges are written and ended. `Render` calls
    /// `renderer` and writes the body; a render failure becomes the 500 page.
    /// `Static` sets the status; serving the file is the caller's job.
    pub fn handle_default(&self, event: &mut Event, renderer: &dyn PageRenderer) -> RouteResult {
        self.apply_headers(event);
        let result = self.route_default(&event.request);

        match &result {
            RouteResult::Redirect {
                status_code,
                location,
            } => event.response.redirect(*status_code, location),
            RouteResult::Unauthorized => event.response.unauthorized(),
            RouteResult::Static { status_code, .. } => event.response.set_status(*status_code),
            RouteResult::Render {
                page,
                params,
                is_data,
                querystring,
            } => {
                let path = self.lookup_path(&event.request.uri);
                let request = RenderRequest {
                    path: if *is_data {
                        self.data_page_path(path).unwrap_or_else(|| path.to_string())
                    } else {
                        path.to_string()
                    },
                    params: params.clone(),
                    query: querystring.clone(),
                    is_data: *is_data,
                };
                match renderer.render(page, &request) {
                    Ok(rendered) => {
                        let response = &mut event.response;
                        if *is_data {
                            response.set_header(
                                header::CONTENT_TYPE,
                                header::HeaderValue::from_static("application/json"),
                            );
                            response.write_body(rendered.page_data.to_string());
                        } else {
                            response.set_header(
                                header::CONTENT_TYPE,
                                header::HeaderValue::from_static("text/html"),
                            );
                            response.write_body(rendered.html);
                        }
                        response.end();
                    }
                    Err(err) => {
                        warn!(page = %page, error = %err, "Render failed, serving error page");
                        event.response.set_status(500);
                        return RouteResult::Static {
                            file: self.inner.error_file.clone(),
                            status_code: 500,
                            is_data: false,
                        };
                    }
                }
            }
            RouteResult::PublicFile { .. }
            | RouteResult::External { .. }
            | RouteResult::ApiInvoke { .. }
            | RouteResult::NotFound => {}
        }

        result
    }

    /// Resolve an API request and act on terminal outcomes.
    ///
    /// `ApiInvoke` and `External` leave the response untouched for the caller.
    pub fn handle_api(&self, event: &mut Event) -> RouteResult {
        self.apply_headers(event);
        let result = self.route_api(&event.request);

        match &result {
            RouteResult::Redirect {
                status_code,
                location,
            } => event.response.redirect(*status_code, location),
            RouteResult::Unauthorized => event.response.unauthorized(),
            RouteResult::NotFound => {
                event.response.set_status(404);
                event.response.end();
            }
            _ => {}
        }

        result
    }
}
