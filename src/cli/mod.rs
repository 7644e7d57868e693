//! # CLI Module
//!
//! Command-line tooling over a build's manifests. Every command prints JSON
//! to stdout.
//!
//! ## Commands
//!
//! ### `resolve`
//!
//! Resolve one request and show the route result plus the response the
//! resolver wrote:
//!
//! ```bash
//! brrtedge resolve --manifests .serverless_nextjs /blog/hello?draft=1
//! brrtedge resolve --manifests .serverless_nextjs /api/users/42 --api
//! brrtedge resolve /old --host example.com -H "authorization: Basic dGVzdDp0ZXN0"
//! ```
//!
//! `Render` outcomes are answered by an echo renderer that reports the page
//! and render request instead of running any page code.
//!
//! ### `routes`
//!
//! Dump the compiled page and API tables:
//!
//! ```bash
//! brrtedge routes --manifests .serverless_nextjs
//! ```
//!
//! ### `cache-control`
//!
//! ```bash
//! brrtedge cache-control --revalidate false
//! brrtedge cache-control --revalidate 60 --expires "Wed, 21 Apr 2021 04:47:27 GMT"
//! ```
//!
//! `--manifests` and `--long-ttl` fall back to `BRRTE_MANIFEST_DIR` and
//! `BRRTE_LONG_TTL_SECS`.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, execute_with, parse_revalidate, run_cli, Cli, Commands};
