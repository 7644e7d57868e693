use http::header::{HeaderName, HeaderValue};
use tracing::warn;

use super::destination::Destination;
use crate::manifest::HeaderRule;
use crate::router::{PatternError, RoutePattern};

#[derive(Debug, Clone)]
struct CompiledHeaderRule {
    source: RoutePattern,
    headers: Vec<(HeaderName, Destination)>,
}

/// Header rules compiled in manifest order. Every matching rule applies.
#[derive(Debug, Clone, Default)]
pub struct HeaderRules {
    rules: Vec<CompiledHeaderRule>,
}

impl HeaderRules {
    /// Compile header rules. Entries whose key is not a valid header name are
    /// dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when a source pattern does not compile.
    pub fn compile(rules: &[HeaderRule]) -> Result<Self, PatternError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut headers = Vec::with_capacity(rule.headers.len());
            for entry in &rule.headers {
                match HeaderName::from_bytes(entry.key.as_bytes()) {
                    Ok(name) => headers.push((name, Destination::new(&entry.value))),
                    Err(_) => warn!(
                        source = %rule.source,
                        header = %entry.key,
                        "Ignoring header rule with invalid header name"
                    ),
                }
            }
            compiled.push(CompiledHeaderRule {
                source: RoutePattern::compile(&rule.source)?,
                headers,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Headers of every rule matching `uri`, in rule order, with `:name`
    /// placeholders substituted.
    #[must_use]
    pub fn matching(&self, uri: &str) -> Vec<(HeaderName, HeaderValue)> {
        let mut out = Vec::new();
        for rule in &self.rules {
            let Some(params) = rule.source.matches(uri) else {
                continue;
            };
            for (name, template) in &rule.headers {
                let substituted = template.substitute(&params);
                let raw = match substituted.query {
                    Some(query) => format!("{}?{}", substituted.path, query),
                    None => substituted.path,
                };
                match HeaderValue::from_str(&raw) {
                    Ok(value) => out.push((name.clone(), value)),
                    Err(_) => warn!(
                        uri = %uri,
                        header = %name,
                        "Skipping header with invalid value"
                    ),
                }
            }
        }
        out
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
