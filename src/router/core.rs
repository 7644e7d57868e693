//! Router core module - hot path for page and API route lookup.
//!
//! # JSF Compliance (Rule 206)
//!
//! Route tables are compiled once when the manifests load. Lookups borrow the
//! compiled tables and only allocate for the captured parameter values.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::collections::HashMap;
use tracing::{debug, info};

use super::pattern::{Params, PatternError, RoutePattern};

/// A successful lookup: the pattern that matched, the value it maps to and
/// the captured parameters.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub pattern: &'a RoutePattern,
    pub target: &'a T,
    pub params: Params,
}

/// Route table for one manifest class (pages or API handlers).
///
/// Literal routes are an exact-match map; dynamic routes are an ordered list
/// sorted by specificity, so the most specific pattern wins and equally
/// specific patterns keep their manifest order.
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    literal: HashMap<String, T>,
    dynamic: Vec<(RoutePattern, T)>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            literal: HashMap::new(),
            dynamic: Vec::new(),
        }
    }
}

impl<T> RouteTable<T> {
    /// Compile a route table from `(route, target)` entries in manifest order.
    ///
    /// Routes without bracket segments go into the literal map.
    ///
    /// # Errors
    ///
    /// Returns the first [`PatternError`] hit while compiling a dynamic route.
    pub fn new<I>(entries: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = (String, T)>,
    {
        let mut literal = HashMap::new();
        let mut dynamic = Vec::new();
        for (route, target) in entries {
            if is_dynamic_route(&route) {
                dynamic.push((RoutePattern::compile(&route)?, target));
            } else {
                literal.insert(route, target);
            }
        }
        // Stable: equally specific routes stay in manifest order.
        dynamic.sort_by(|(a, _), (b, _)| a.kinds().cmp(b.kinds()));

        info!(
            literal_routes = literal.len(),
            dynamic_routes = dynamic.len(),
            "Route table compiled"
        );

        Ok(Self { literal, dynamic })
    }

    /// Exact lookup against literal routes only.
    #[must_use]
    pub fn literal(&self, path: &str) -> Option<&T> {
        self.literal.get(path)
    }

    /// Match against dynamic routes only, most specific first.
    #[must_use]
    pub fn dynamic(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        for (pattern, target) in &self.dynamic {
            if let Some(params) = pattern.matches(path) {
                debug!(
                    path = %path,
                    route_pattern = %pattern.source(),
                    path_params = ?params,
                    "Dynamic route matched"
                );
                return Some(RouteMatch {
                    pattern,
                    target,
                    params,
                });
            }
        }
        None
    }

    /// Literal lookup first, then dynamic patterns.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<(&T, Params)> {
        if let Some(target) = self.literal(path) {
            return Some((target, Params::new()));
        }
        self.dynamic(path).map(|m| (m.target, m.params))
    }

    /// Iterate every route: literal routes (unordered) then dynamic routes in
    /// match order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &T)> {
        self.literal
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .chain(self.dynamic.iter().map(|(p, v)| (p.source(), v)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literal.len() + self.dynamic.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A manifest route is dynamic when any segment uses the bracket syntax.
#[must_use]
pub fn is_dynamic_route(route: &str) -> bool {
    route.contains('[')
}
