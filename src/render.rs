//! Page render collaborator.
//!
//! Rendering is not done by this crate. The resolver and the regeneration
//! manager call a [`PageRenderer`] with the page entry point and the captured
//! params, and only decide what to do with the result.
//!
//! Calls are synchronous: a renderer that does I/O blocks the calling worker
//! until the page is ready, the same way handlers run on a coroutine worker.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::manifest::Revalidate;
use crate::router::Params;

/// What the renderer is asked to produce.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Concrete request path, base path stripped.
    pub path: String,
    pub params: Params,
    pub query: Option<String>,
    /// The caller wants page data (JSON) rather than HTML.
    pub is_data: bool,
}

/// A rendered page: the HTML and the page data it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    pub page_data: Value,
    /// Revalidation window reported by the page, overriding the manifest.
    pub revalidate: Option<Revalidate>,
}

impl RenderedPage {
    #[must_use]
    pub fn new(html: impl Into<String>, page_data: Value) -> Self {
        Self {
            html: html.into(),
            page_data,
            revalidate: None,
        }
    }

    #[must_use]
    pub fn with_revalidate(mut self, revalidate: Revalidate) -> Self {
        self.revalidate = Some(revalidate);
        self
    }
}

/// Render failure reported by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No render entry point exists for the page.
    PageNotFound(String),
    /// The page threw while rendering.
    Failed { page: String, message: String },
}

impl RenderError {
    #[must_use]
    pub fn failed(page: &str, message: impl Into<String>) -> Self {
        RenderError::Failed {
            page: page.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::PageNotFound(page) => write!(f, "no renderer for page '{page}'"),
            RenderError::Failed { page, message } => {
                write!(f, "rendering '{page}' failed: {message}")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Renders a page entry point.
pub trait PageRenderer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RenderError`] when the page cannot be rendered.
    fn render(&self, page: &str, request: &RenderRequest) -> Result<RenderedPage, RenderError>;
}

impl<F> PageRenderer for F
where
    F: Fn(&str, &RenderRequest) -> Result<RenderedPage, RenderError> + Send + Sync,
{
    fn render(&self, page: &str, request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        self(page, request)
    }
}
