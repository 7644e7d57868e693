//! # Resolver Module
//!
//! Classifies one request into exactly one [`RouteResult`].
//!
//! ## Page flow precedence
//!
//! 1. Basic auth (when configured)
//! 2. Domain redirect, trailing-slash redirect, configured redirects
//! 3. Public file (percent-decoded exact match)
//! 4. Data route `/_next/data/<buildId>/<page>.json`
//! 5. Literal page routes
//! 6. Rewrites (one hop)
//! 7. Dynamic page routes, most specific first
//! 8. The 404 page
//!
//! Header rules are applied to the response before any of this and stay on
//! it whatever the outcome.
//!
//! ## API flow precedence
//!
//! Same preamble, then literal API routes, rewrites, dynamic API routes and
//! finally a bare 404.
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Edge
//!     participant Resolver
//!     participant Rules
//!     participant Pages as RouteTable
//!     participant Renderer as PageRenderer
//!
//!     Edge->>Resolver: handle_default(event)
//!     Resolver->>Rules: headers / redirects
//!     alt redirect matched
//!         Resolver-->>Edge: Redirect (response ended)
//!     end
//!     Resolver->>Pages: literal(path)
//!     Resolver->>Rules: rewrites
//!     Resolver->>Pages: dynamic(path)
//!     alt SSR page
//!         Resolver->>Renderer: render(page, params)
//!         Renderer-->>Resolver: html / error
//!     end
//!     Resolver-->>Edge: RouteResult
//! ```

mod core;
mod types;


pub use self::core::Resolver;
pub use self::types::{Event, Request, Response, RouteResult};
