use chrono::{DateTime, Utc};
use http::header::{self, HeaderMap, HeaderValue};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cache_control::{CacheControl, CachePolicy, Freshness};
use super::state::{ArtifactState, InvalidTransition, MissPlan, Transition};
use crate::manifest::{PageKind, Revalidate};
use crate::render::{PageRenderer, RenderError, RenderRequest, RenderedPage};
use crate::resolver::{Request, Resolver, Response};
use crate::router::Params;
use crate::runtime_config::RuntimeConfig;
use crate::store::{Artifact, ArtifactStore, StoreError};

const TEXT_HTML: &str = "text/html";
const APPLICATION_JSON: &str = "application/json";

/// The origin's answer as seen by the edge.
#[derive(Debug, Clone, Default)]
pub struct OriginResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OriginResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Add a header. Invalid names or values are logged and skipped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            header::HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid origin header"),
        }
        self
    }

    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self.status, 403 | 404)
    }
}

/// A stale artifact the caller may regenerate in the background.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationRequest {
    pub page: String,
    /// Page path, base path stripped.
    pub path: String,
    pub params: Params,
    pub revalidate: Revalidate,
}

#[derive(Debug)]
pub struct OriginOutcome {
    pub response: Response,
    pub state: ArtifactState,
    pub regenerate: Option<RegenerationRequest>,
}

#[derive(Debug)]
pub enum RegenerationError {
    Render(RenderError),
    Store(StoreError),
    InvalidTransition(InvalidTransition),
}

impl fmt::Display for RegenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegenerationError::Render(e) => write!(f, "regeneration render failed: {e}"),
            RegenerationError::Store(e) => write!(f, "regeneration store failed: {e}"),
            RegenerationError::InvalidTransition(e) => write!(f, "regeneration state error: {e}"),
        }
    }
}

impl std::error::Error for RegenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegenerationError::Render(e) => Some(e),
            RegenerationError::Store(e) => Some(e),
            RegenerationError::InvalidTransition(e) => Some(e),
        }
    }
}

impl From<RenderError> for RegenerationError {
    fn from(e: RenderError) -> Self {
        RegenerationError::Render(e)
    }
}

impl From<StoreError> for RegenerationError {
    fn from(e: StoreError) -> Self {
        RegenerationError::Store(e)
    }
}

impl From<InvalidTransition> for RegenerationError {
    fn from(e: InvalidTransition) -> Self {
        RegenerationError::InvalidTransition(e)
    }
}

/// Store keys of one page's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKeys {
    pub html: String,
    pub data: String,
}

/// Page path and request shape derived from an origin-response URI.
struct OriginTarget {
    page_path: String,
    is_data: bool,
}

/// Intercepts origin responses at the edge and regenerates missing or stale
/// statically generated pages.
///
/// Holds no per-route state between calls; every decision is derived from
/// the manifests and the origin response.
pub struct RegenerationManager {
    resolver: Resolver,
    store: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn PageRenderer>,
    policy: CachePolicy,
}

impl RegenerationManager {
    /// Manager with the default [`CachePolicy`]. Use
    /// [`RegenerationManager::from_config`] to follow `BRRTE_LONG_TTL_SECS`.
    #[must_use]
    pub fn new(
        resolver: Resolver,
        store: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            resolver,
            store,
            renderer,
            policy: CachePolicy::default(),
        }
    }

    /// Build a manager whose cache policy follows `config`.
    #[must_use]
    pub fn from_config(
        config: &RuntimeConfig,
        resolver: Resolver,
        store: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self::new(resolver, store, renderer).with_policy(config.cache_policy())
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn key_prefix(&self) -> String {
        let base = self.resolver.base_path().trim_matches('/');
        if base.is_empty() {
            String::new()
        } else {
            format!("{base}/")
        }
    }

    /// Keys for the HTML and data artifacts of `page_path`.
    #[must_use]
    pub fn artifact_keys(&self, page_path: &str) -> ArtifactKeys {
        let prefix = self.key_prefix();
        let build_id = self.resolver.build_id();
        let name = if page_path == "/" {
            "index"
        } else {
            page_path.trim_start_matches('/')
        };
        ArtifactKeys {
            html: format!("{prefix}static-pages/{build_id}/{name}.html"),
            data: format!("{prefix}_next/data/{build_id}/{name}.json"),
        }
    }

    fn static_key(&self, file: &str) -> String {
        format!(
            "{}static-pages/{}/{}",
            self.key_prefix(),
            self.resolver.build_id(),
            file.trim_start_matches('/')
        )
    }

    fn target(&self, uri: &str) -> OriginTarget {
        let path = self.resolver.normalise(uri);
        if let Some(page_path) = self.resolver.data_page_path(path) {
            return OriginTarget {
                page_path,
                is_data: true,
            };
        }
        let page_path = match path.strip_suffix(".html") {
            Some("/index") => "/",
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };
        OriginTarget {
            page_path: page_path.to_string(),
            is_data: false,
        }
    }

    fn revalidate_for(&self, kind: Option<&PageKind>, page_path: &str) -> Option<Revalidate> {
        if let Some(PageKind::Ssg { revalidate, .. }) = kind {
            return Some(*revalidate);
        }
        self.resolver
            .manifests()
            .prerender
            .routes
            .get(page_path)
            .map(|r| r.initial_revalidate_seconds)
    }

    /// Handle an origin response using the current time.
    ///
    /// # Errors
    ///
    /// See [`RegenerationManager::handle_origin_response_at`].
    pub fn handle_origin_response(
        &self,
        request: &Request,
        origin: OriginResponse,
    ) -> Result<OriginOutcome, RegenerationError> {
        self.handle_origin_response_at(request, origin, Utc::now())
    }

    /// Handle an origin response as of `now`.
    ///
    /// A hit (any status but 403/404) is passed through with cache control
    /// recomputed from its freshness headers. A miss is resolved to a page
    /// and handled per its fallback mode.
    ///
    /// # Errors
    ///
    /// Render and store failures during a miss are returned unmodified.
    pub fn handle_origin_response_at(
        &self,
        request: &Request,
        origin: OriginResponse,
        now: DateTime<Utc>,
    ) -> Result<OriginOutcome, RegenerationError> {
        let target = self.target(&request.uri);
        if origin.is_miss() {
            self.handle_miss(request, origin, &target, now)
        } else {
            Ok(self.handle_hit(request, origin, &target, now))
        }
    }

    fn handle_hit(
        &self,
        request: &Request,
        origin: OriginResponse,
        target: &OriginTarget,
        now: DateTime<Utc>,
    ) -> OriginOutcome {
        let mut response = Response::new();
        let status = if origin.status == 200 && self.resolver.normalise(&request.uri) == "/404.html"
        {
            404
        } else {
            origin.status
        };
        response.set_status(status);
        for (name, value) in &origin.headers {
            response.append_header(name.clone(), value.clone());
        }
        if let Some(body) = origin.body {
            response.write_body(body);
        }

        let found = self.resolver.find_page(&target.page_path);
        let kind = found.as_ref().map(|(kind, _)| *kind);
        let revalidate = self.revalidate_for(kind, &target.page_path);
        let freshness = Freshness::from_headers(&origin.headers);

        let mut stale = false;
        if let Some(cache_control) = self.policy.cache_control(revalidate, &freshness, now) {
            stale = cache_control.is_stale();
            response.set_header_str(header::CACHE_CONTROL, &cache_control.to_string());
        }
        let state = ArtifactState::observe(status, stale);

        let regenerate = match (state, found) {
            (ArtifactState::Stale, Some((kind, params))) => kind.page().map(|page| {
                RegenerationRequest {
                    page: page.to_string(),
                    path: target.page_path.clone(),
                    params,
                    revalidate: revalidate.unwrap_or_default(),
                }
            }),
            _ => None,
        };

        debug!(
            uri = %request.uri,
            status_code = status,
            state = ?state,
            regenerate = regenerate.is_some(),
            "Origin hit"
        );

        OriginOutcome {
            response,
            state,
            regenerate,
        }
    }

    fn handle_miss(
        &self,
        request: &Request,
        origin: OriginResponse,
        target: &OriginTarget,
        now: DateTime<Utc>,
    ) -> Result<OriginOutcome, RegenerationError> {
        let mut response = Response::new();
        for (name, value) in &origin.headers {
            response.append_header(name.clone(), value.clone());
        }

        let found = self.resolver.find_page(&target.page_path);
        let plan = MissPlan::for_page(found.as_ref().map(|(kind, _)| *kind), target.is_data);
        let params = found.map(|(_, params)| params).unwrap_or_default();
        let render_request = RenderRequest {
            path: target.page_path.clone(),
            params,
            query: request.querystring.clone(),
            is_data: target.is_data,
        };

        debug!(uri = %request.uri, page_path = %target.page_path, plan = ?plan, "Origin miss");

        let mut state = ArtifactState::Missing;
        match plan {
            MissPlan::NotFound => {
                let key = self.static_key("404.html");
                let page = self.store.get(&key)?;
                if page.is_none() {
                    warn!(key = %key, "404 page missing from artifact store");
                }
                response.set_status(404);
                response.set_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
                response.set_header_str(
                    header::CACHE_CONTROL,
                    &CacheControl::immutable(self.policy.long_ttl_secs).to_string(),
                );
                if let Some(page) = page {
                    response.write_body(page.body);
                }
            }
            MissPlan::RenderUncached { page } => {
                let rendered = self.render(&mut state, &page, &render_request)?;
                state = state.apply(Transition::Discarded)?;
                write_rendered(&mut response, &rendered, target.is_data);
            }
            MissPlan::RenderBlocking { page, revalidate } => {
                let rendered = self.render(&mut state, &page, &render_request)?;
                let revalidate = rendered.revalidate.unwrap_or(revalidate);
                let expires = self.persist(&target.page_path, &rendered, revalidate, now)?;
                state = state.apply(Transition::Persisted)?;

                write_rendered(&mut response, &rendered, target.is_data);
                let cache_control = if target.is_data {
                    let freshness = Freshness {
                        expires,
                        last_modified: None,
                    };
                    self.policy
                        .cache_control(Some(revalidate), &freshness, now)
                        .unwrap_or_else(CacheControl::revalidate_now)
                } else {
                    CacheControl::revalidate_now()
                };
                response.set_header_str(header::CACHE_CONTROL, &cache_control.to_string());
            }
            MissPlan::ServePlaceholder { page, placeholder } => {
                let rendered = self.render(&mut state, &page, &render_request)?;
                let revalidate = rendered.revalidate.unwrap_or_default();
                self.persist(&target.page_path, &rendered, revalidate, now)?;
                state = state.apply(Transition::Persisted)?;

                let key = self.static_key(&placeholder);
                match self.store.get(&key)? {
                    Some(artifact) => {
                        response.set_status(200);
                        response.set_header(
                            header::CONTENT_TYPE,
                            HeaderValue::from_static(TEXT_HTML),
                        );
                        response.write_body(artifact.body);
                    }
                    None => {
                        warn!(key = %key, "Placeholder missing, serving rendered page");
                        write_rendered(&mut response, &rendered, false);
                    }
                }
                response.set_header_str(
                    header::CACHE_CONTROL,
                    &CacheControl::revalidate_now().to_string(),
                );
            }
        }

        Ok(OriginOutcome {
            response,
            state,
            regenerate: None,
        })
    }

    fn render(
        &self,
        state: &mut ArtifactState,
        page: &str,
        request: &RenderRequest,
    ) -> Result<RenderedPage, RegenerationError> {
        *state = state.apply(Transition::RenderStarted)?;
        match self.renderer.render(page, request) {
            Ok(rendered) => Ok(rendered),
            Err(e) => {
                *state = state.apply(Transition::RenderFailed)?;
                warn!(page = %page, path = %request.path, error = %e, "Regeneration render failed");
                Err(e.into())
            }
        }
    }

    /// Write page data, then HTML. Returns the artifacts' expiry.
    fn persist(
        &self,
        page_path: &str,
        rendered: &RenderedPage,
        revalidate: Revalidate,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let keys = self.artifact_keys(page_path);
        let freshness = self.policy.for_artifact(revalidate, now);
        let cache_control = freshness.cache_control.map(|c| c.to_string());

        let artifacts = [
            Artifact {
                key: keys.data,
                body: rendered.page_data.to_string().into_bytes(),
                content_type: APPLICATION_JSON.to_string(),
                cache_control: cache_control.clone(),
                expires: freshness.expires,
            },
            Artifact {
                key: keys.html,
                body: rendered.html.clone().into_bytes(),
                content_type: TEXT_HTML.to_string(),
                cache_control,
                expires: freshness.expires,
            },
        ];
        for artifact in artifacts {
            let key = artifact.key.clone();
            if let Err(e) = self.store.put(artifact) {
                error!(key = %key, error = %e, "Failed to persist artifact");
                return Err(e);
            }
        }

        info!(
            page_path = %page_path,
            revalidate = %revalidate,
            "Artifacts regenerated"
        );
        Ok(freshness.expires)
    }

    /// Regenerate a stale artifact reported by a previous hit.
    ///
    /// # Errors
    ///
    /// Render and store failures are returned unmodified.
    pub fn regenerate(
        &self,
        request: &RegenerationRequest,
        now: DateTime<Utc>,
    ) -> Result<ArtifactState, RegenerationError> {
        let mut state = ArtifactState::Stale;
        let render_request = RenderRequest {
            path: request.path.clone(),
            params: request.params.clone(),
            query: None,
            is_data: false,
        };
        let rendered = self.render(&mut state, &request.page, &render_request)?;
        let revalidate = rendered.revalidate.unwrap_or(request.revalidate);
        self.persist(&request.path, &rendered, revalidate, now)?;
        state.apply(Transition::Persisted).map_err(Into::into)
    }
}

fn write_rendered(response: &mut Response, rendered: &RenderedPage, is_data: bool) {
    response.set_status(200);
    if is_data {
        response.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON),
        );
        response.write_body(rendered.page_data.to_string());
    } else {
        response.set_header(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML));
        response.write_body(rendered.html.clone());
    }
}
