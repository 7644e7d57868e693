use serde::Serialize;
use std::fmt;

use crate::manifest::{FallbackMode, PageKind, Revalidate};

/// Lifecycle of one rendered artifact, keyed by its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    /// The origin signalled not-found or forbidden.
    Missing,
    /// The renderer has been invoked.
    Rendering,
    /// Stored and inside its revalidation window.
    Fresh,
    /// Stored but past its window; eligible for regeneration.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    RenderStarted,
    Persisted,
    RenderFailed,
    /// Rendered for this response only; nothing was stored.
    Discarded,
    WindowElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ArtifactState,
    pub transition: Transition,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot apply {:?} to an artifact in state {:?}", self.transition, self.from)
    }
}

impl std::error::Error for InvalidTransition {}

impl ArtifactState {
    /// State observed from an origin response.
    #[must_use]
    pub fn observe(origin_status: u16, stale: bool) -> Self {
        match (origin_status, stale) {
            (403 | 404, _) => ArtifactState::Missing,
            (_, true) => ArtifactState::Stale,
            (_, false) => ArtifactState::Fresh,
        }
    }

    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `transition` does not apply to
    /// the current state.
    pub fn apply(self, transition: Transition) -> Result<Self, InvalidTransition> {
        use ArtifactState::{Fresh, Missing, Rendering, Stale};
        use Transition::{Discarded, Persisted, RenderFailed, RenderStarted, WindowElapsed};

        match (self, transition) {
            (Missing | Stale, RenderStarted) => Ok(Rendering),
            (Rendering, Persisted) => Ok(Fresh),
            (Rendering, RenderFailed | Discarded) => Ok(Missing),
            (Fresh, WindowElapsed) => Ok(Stale),
            (from, transition) => Err(InvalidTransition { from, transition }),
        }
    }
}

/// What to do about a miss, derived from the route's page kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissPlan {
    /// No renderable page: serve the stored 404 page.
    NotFound,
    /// Render and persist, but answer with the prebuilt placeholder.
    ServePlaceholder { page: String, placeholder: String },
    /// Render, persist and answer with the fresh artifact.
    RenderBlocking { page: String, revalidate: Revalidate },
    /// Server-rendered page: render and answer without persisting.
    RenderUncached { page: String },
}

impl MissPlan {
    /// Data requests never get a placeholder; they block on the render.
    #[must_use]
    pub fn for_page(kind: Option<&PageKind>, is_data: bool) -> Self {
        match kind {
            None | Some(PageKind::Html { .. }) | Some(PageKind::Ssg { page: None, .. }) => {
                MissPlan::NotFound
            }
            Some(PageKind::Ssr { page }) => MissPlan::RenderUncached { page: page.clone() },
            Some(PageKind::Ssg {
                page: Some(page),
                revalidate,
                ..
            }) => MissPlan::RenderBlocking {
                page: page.clone(),
                revalidate: *revalidate,
            },
            Some(PageKind::SsgFallback { page, fallback }) => match fallback {
                FallbackMode::None => MissPlan::NotFound,
                FallbackMode::Placeholder(placeholder) if !is_data => MissPlan::ServePlaceholder {
                    page: page.clone(),
                    placeholder: placeholder.clone(),
                },
                FallbackMode::Placeholder(_) | FallbackMode::Blocking => MissPlan::RenderBlocking {
                    page: page.clone(),
                    revalidate: Revalidate::Never,
                },
            },
        }
    }
}
