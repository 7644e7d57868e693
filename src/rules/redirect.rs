use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::destination::{with_query, Destination};
use crate::manifest::RedirectRule;
use crate::router::{PatternError, RoutePattern};

/// Status used for domain and trailing-slash redirects.
pub const PERMANENT_REDIRECT: u16 = 308;

/// A terminal redirect decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub status_code: u16,
    pub location: String,
}

impl Redirect {
    #[must_use]
    pub fn permanent(location: String) -> Self {
        Self {
            status_code: PERMANENT_REDIRECT,
            location,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRedirect {
    source: RoutePattern,
    destination: Destination,
    status_code: u16,
}

/// Configured redirect rules compiled in manifest order.
#[derive(Debug, Clone, Default)]
pub struct Redirects {
    rules: Vec<CompiledRedirect>,
}

impl Redirects {
    /// # Errors
    ///
    /// Returns [`PatternError`] when a source pattern does not compile.
    pub fn compile(rules: &[RedirectRule]) -> Result<Self, PatternError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRedirect {
                    source: RoutePattern::compile(&rule.source)?,
                    destination: Destination::new(&rule.destination),
                    status_code: rule.status_code(),
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { rules })
    }

    /// First redirect whose source matches `uri`.
    ///
    /// The request query comes first, followed by any query on the
    /// destination template.
    #[must_use]
    pub fn resolve(&self, uri: &str, query: Option<&str>) -> Option<Redirect> {
        let rule = self.rules.iter().find_map(|rule| {
            rule.source.matches(uri).map(|params| (rule, params))
        });
        let (rule, params) = rule?;
        let substituted = rule.destination.substitute(&params);
        let location = with_query(
            &substituted.path,
            query.into_iter().chain(substituted.query.as_deref()),
        );
        debug!(
            uri = %uri,
            redirect_source = %rule.source.source(),
            status_code = rule.status_code,
            location = %location,
            "Redirect matched"
        );
        Some(Redirect {
            status_code: rule.status_code,
            location,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Redirect requests for an alternate host to its canonical origin,
/// preserving path and query.
#[must_use]
pub fn domain_redirect(
    domains: &HashMap<String, String>,
    host: Option<&str>,
    uri: &str,
    query: Option<&str>,
) -> Option<Redirect> {
    let host = host?.to_ascii_lowercase();
    let origin = domains
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(&host))
        .map(|(_, origin)| origin)?;
    let location = with_query(
        &format!("{}{}", origin.trim_end_matches('/'), uri),
        query,
    );
    Some(Redirect::permanent(location))
}

/// The last path segment has an extension.
fn is_file_like(uri: &str) -> bool {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'))
}

/// Canonicalise the trailing slash of `uri`.
///
/// File-like paths never keep a trailing slash. Other paths lose it when
/// `trailing_slash` is off and gain one when it is on. `/` is left alone.
#[must_use]
pub fn trailing_slash_redirect(
    uri: &str,
    query: Option<&str>,
    trailing_slash: bool,
) -> Option<Redirect> {
    if uri == "/" || uri.is_empty() {
        return None;
    }
    let target = if uri.ends_with('/') {
        if trailing_slash && !is_file_like(uri) {
            return None;
        }
        let trimmed = uri.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        if !trailing_slash || is_file_like(uri) {
            return None;
        }
        format!("{uri}/")
    };
    Some(Redirect::permanent(with_query(&target, query)))
}
