use tracing::{debug, warn};

use super::destination::{with_query, Destination};
use crate::manifest::{RewriteRule, RoutesManifest};
use crate::router::{PatternError, RoutePattern};

/// True only for absolute `http://` or `https://` targets.
#[must_use]
pub fn is_external_rewrite(destination: &str) -> bool {
    destination.starts_with("http://") || destination.starts_with("https://")
}

/// Internal targets are rooted paths; protocol-relative `//host` is not one.
fn is_valid_rewrite_target(destination: &str) -> bool {
    is_external_rewrite(destination)
        || (destination.starts_with('/') && !destination.starts_with("//"))
}

#[derive(Debug, Clone)]
struct CompiledRewrite {
    source: RoutePattern,
    destination: Destination,
}

/// Rewrite rules compiled in manifest order.
#[derive(Debug, Clone, Default)]
pub struct Rewrites {
    rules: Vec<CompiledRewrite>,
}

impl Rewrites {
    /// Compile rewrite rules. Rules whose destination is neither an internal
    /// path nor an `http(s)` URL can never match and are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when a source pattern does not compile.
    pub fn compile(rules: &[RewriteRule]) -> Result<Self, PatternError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if !is_valid_rewrite_target(&rule.destination) {
                warn!(
                    source = %rule.source,
                    destination = %rule.destination,
                    "Ignoring rewrite with unsupported destination"
                );
                continue;
            }
            compiled.push(CompiledRewrite {
                source: RoutePattern::compile(&rule.source)?,
                destination: Destination::new(&rule.destination),
            });
        }
        Ok(Self { rules: compiled })
    }

    /// First matching rewrite for `path`, with params substituted.
    ///
    /// Params not consumed by a placeholder are appended to the query string
    /// in capture order, one pair per catch-all segment.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<String> {
        for rule in &self.rules {
            let Some(params) = rule.source.matches(path) else {
                continue;
            };
            let substituted = rule.destination.substitute(&params);

            let appended: Vec<String> = substituted
                .unused
                .iter()
                .flat_map(|(name, value)| {
                    value.segments().iter().map(move |segment| {
                        format!(
                            "{}={}",
                            urlencoding::encode(name),
                            urlencoding::encode(segment)
                        )
                    })
                })
                .collect();

            let target = with_query(
                &substituted.path,
                substituted
                    .query
                    .as_deref()
                    .into_iter()
                    .chain(appended.iter().map(String::as_str)),
            );

            debug!(
                path = %path,
                rewrite_source = %rule.source.source(),
                rewrite_destination = %rule.destination.template(),
                target = %target,
                "Rewrite matched"
            );
            return Some(target);
        }
        None
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

/// Resolve `path` against the rewrites of `manifest`.
///
/// Compiles the rules on every call; long-lived callers hold a
/// [`Rewrites`] instead.
///
/// # Errors
///
/// Returns [`PatternError`] when a rewrite source does not compile.
pub fn get_rewrite_path(path: &str, manifest: &RoutesManifest) -> Result<Option<String>, PatternError> {
    Ok(Rewrites::compile(&manifest.rewrites)?.resolve(path))
}
