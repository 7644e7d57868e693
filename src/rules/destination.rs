use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::router::{ParamValue, Params};

/// `:name` placeholder with an optional `*`, `+` or `?` modifier.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)[*+?]?").expect("placeholder regex should be valid")
});

/// A destination template such as `/news/:slug` or `/target?key=:path`.
#[derive(Debug, Clone)]
pub(crate) struct Destination {
    template: String,
}

/// Result of substituting captured params into a template.
pub(crate) struct Substituted<'p> {
    pub path: String,
    pub query: Option<String>,
    pub unused: Vec<(&'p str, &'p ParamValue)>,
}

impl Destination {
    pub(crate) fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub(crate) fn template(&self) -> &str {
        &self.template
    }

    /// Replace placeholders that name a captured param. Unknown placeholders
    /// are left as written. Catch-all values are re-joined with `/`.
    ///
    /// The template is split at its query separator first, so a `?` right
    /// after a placeholder (`/b/:id?x=1`) starts the query.
    pub(crate) fn substitute<'p>(&self, params: &'p Params) -> Substituted<'p> {
        let mut used: HashSet<String> = HashSet::new();
        let (path, query) = match query_start(&self.template) {
            Some(at) => (&self.template[..at], Some(&self.template[at + 1..])),
            None => (self.template.as_str(), None),
        };

        let path = replace_placeholders(path, params, &mut used);
        let query = query.map(|q| replace_placeholders(q, params, &mut used));

        let unused = params
            .iter()
            .filter(|(name, _)| !used.contains(*name))
            .collect();

        Substituted {
            path,
            query: query.filter(|q| !q.is_empty()),
            unused,
        }
    }
}

fn replace_placeholders(text: &str, params: &Params, used: &mut HashSet<String>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            match params.get(name) {
                Some(value) => {
                    used.insert(name.to_string());
                    value.joined().into_owned()
                }
                None => caps.get(0).map_or("", |m| m.as_str()).to_string(),
            }
        })
        .into_owned()
}

/// `prefix` ends in a `:name` placeholder.
fn ends_with_placeholder(prefix: &str) -> bool {
    let head = prefix.trim_end_matches(|c: char| c.is_ascii_alphanumeric() || c == '_');
    head.len() < prefix.len() && head.ends_with(':')
}

/// Byte offset of the `?` that starts the query.
///
/// A `?` directly after a placeholder is its optional modifier only when it
/// ends the template or is followed by `/`.
fn query_start(template: &str) -> Option<usize> {
    let bytes = template.as_bytes();
    template.match_indices('?').map(|(at, _)| at).find(|&at| {
        let modifier_position = matches!(bytes.get(at + 1), None | Some(b'/'));
        !(modifier_position && ends_with_placeholder(&template[..at]))
    })
}

/// Join non-empty query fragments with `&` and append them to `path`.
pub(crate) fn with_query<'a>(path: &str, parts: impl IntoIterator<Item = &'a str>) -> String {
    let query = parts
        .into_iter()
        .filter(|q| !q.is_empty())
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}
