//! # Regeneration Module
//!
//! Incremental regeneration of statically generated pages behind an edge
//! cache.
//!
//! ## Overview
//!
//! - [`CachePolicy`] - pure cache-control arithmetic
//! - [`ArtifactState`] - `MISSING → RENDERING → FRESH ⇄ STALE` lifecycle
//! - [`MissPlan`] - what a miss means for a route's fallback mode
//! - [`RegenerationManager`] - the origin-response flow
//!
//! ## Origin-response flow
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> Missing: origin 403/404
//!     [*] --> Fresh: origin hit, expiry ahead
//!     [*] --> Stale: origin hit, expiry passed
//!     Missing --> Rendering: render started
//!     Stale --> Rendering: regenerate
//!     Rendering --> Fresh: data + HTML persisted
//!     Rendering --> Missing: render failed
//!     Rendering --> Missing: SSR, not stored
//!     Fresh --> Stale: window elapsed
//! ```
//!
//! Concurrent misses for one key may each render and write. Writes are
//! idempotent and the data artifact is always written before its HTML.

mod cache_control;
mod manager;
mod state;


pub use cache_control::{
    format_http_date, parse_http_date, ArtifactFreshness, CacheControl, CachePolicy, Freshness,
    DEFAULT_LONG_TTL_SECS,
};
pub use manager::{
    ArtifactKeys, OriginOutcome, OriginResponse, RegenerationError, RegenerationManager,
    RegenerationRequest,
};
pub use state::{ArtifactState, InvalidTransition, MissPlan, Transition};
