//! # Router Module
//!
//! Path matching for manifest routes and rule sources.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route patterns (`/blog/[slug]`, `/docs/[...path]`, `/old/:id(\d+)`)
//!   into anchored regexes once, at manifest load
//! - Matching a concrete path against a pattern and extracting parameters
//! - Keeping page and API route tables ordered by specificity
//!
//! ## Architecture
//!
//! 1. **Compilation**: [`RoutePattern::compile`] turns a pattern into a regex plus
//!    the list of named captures. [`RouteTable::new`] splits a manifest into an
//!    exact-match map and a specificity-sorted dynamic list.
//!
//! 2. **Matching**: literal routes are a hash lookup; dynamic routes are tried in
//!    order until one consumes the whole path. No partial matches are accepted.
//!
//! ## Example
//!
//! ```rust
//! use brrtedge::router::{ParamValue, RoutePattern};
//!
//! let pattern = RoutePattern::compile("/docs/[...path]").unwrap();
//! let params = pattern.matches("/docs/a/b").unwrap();
//! assert_eq!(
//!     params.get("path"),
//!     Some(&ParamValue::Multi(vec!["a".into(), "b".into()]))
//! );
//! assert!(pattern.matches("/docs").is_none());
//! ```

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use self::core::{is_dynamic_route, RouteMatch, RouteTable};
pub use self::pattern::{
    ParamValue, ParamVec, Params, PatternError, RoutePattern, SegmentKind, MAX_INLINE_PARAMS,
};
