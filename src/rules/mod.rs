//! # Rules Module
//!
//! Header, redirect and rewrite rules from the routes manifest, compiled once.
//!
//! Rule sources use the `:name` grammar of [`crate::router::RoutePattern`] and
//! are matched against the full request path, base path included. Destination
//! templates substitute `:name` placeholders from the source match.
//!
//! - [`Rewrites`] - first match wins; unused params are appended to the query
//! - [`Redirects`] - first match wins; the request query is preserved
//! - [`HeaderRules`] - every matching rule contributes headers
//! - [`domain_redirect`] / [`trailing_slash_redirect`] - canonicalisation

mod destination;
mod headers;
mod redirect;
mod rewrite;


pub use headers::HeaderRules;
pub use redirect::{
    domain_redirect, trailing_slash_redirect, Redirect, Redirects, PERMANENT_REDIRECT,
};
pub use rewrite::{get_rewrite_path, is_external_rewrite, Rewrites};

use crate::manifest::RoutesManifest;
use crate::router::PatternError;

/// All rules of one routes manifest.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub headers: HeaderRules,
    pub redirects: Redirects,
    pub rewrites: Rewrites,
}

impl CompiledRules {
    /// # Errors
    ///
    /// Returns the first [`PatternError`] among all rule sources.
    pub fn compile(manifest: &RoutesManifest) -> Result<Self, PatternError> {
        Ok(Self {
            headers: HeaderRules::compile(&manifest.headers)?,
            redirects: Redirects::compile(&manifest.redirects)?,
            rewrites: Rewrites::compile(&manifest.rewrites)?,
        })
    }
}
