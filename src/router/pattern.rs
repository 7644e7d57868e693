//! Route pattern compilation - the path matcher.
//!
//! Two pattern grammars share one compiler:
//!
//! | Form | Page manifest | Rule source |
//! |---|---|---|
//! | single dynamic segment | `[slug]` | `:slug` |
//! | constrained segment | `[id(\d+)]` | `:id(\d+)` |
//! | catch-all (one or more) | `[...path]` | `:path+` |
//! | optional catch-all | `[[...path]]` | `:path*` |
//! | optional segment | | `:lang?` |
//! | non-capturing constraint | | `(en\|nl\|fr)` |
//!
//! Every pattern becomes one anchored regex at load time; matching a request path
//! is a single `captures` call and never reparses the pattern.

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Maximum number of captured parameters before heap allocation.
/// Page routes rarely carry more than two or three dynamic segments.
pub const MAX_INLINE_PARAMS: usize = 8;

/// A captured parameter value.
///
/// Catch-all segments capture the remaining path as an ordered list of
/// segments; every other dynamic segment captures one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// The value as a single string, `None` for catch-all captures.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s.as_str()),
            ParamValue::Multi(_) => None,
        }
    }

    /// The captured segments in order (a single value is one segment).
    #[must_use]
    pub fn segments(&self) -> &[String] {
        match self {
            ParamValue::Single(s) => std::slice::from_ref(s),
            ParamValue::Multi(v) => v.as_slice(),
        }
    }

    /// The value re-joined as a path fragment (`["a", "b"]` → `a/b`).
    #[must_use]
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            ParamValue::Single(s) => Cow::Borrowed(s.as_str()),
            ParamValue::Multi(v) => Cow::Owned(v.join("/")),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Single(s) => serializer.serialize_str(s),
            ParamValue::Multi(v) => v.serialize(serializer),
        }
    }
}

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the compiled pattern and
/// are shared by every match; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>;

/// Parameters captured by a successful match, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(ParamVec);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self(ParamVec::new())
    }

    pub fn push(&mut self, name: Arc<str>, value: ParamValue) {
        self.0.push((name, value));
    }

    /// Get a parameter by name. Last write wins when a name repeats.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Shorthand for single-valued parameters.
    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

/// Error raised while compiling a route pattern.
///
/// Patterns are compiled when the manifests are loaded, so any of these is a
/// load-time failure rather than a per-request one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Parentheses or brackets do not balance.
    Unbalanced { pattern: String },
    /// A dynamic segment has an empty or non-identifier name.
    InvalidParamName { pattern: String, segment: String },
    /// A catch-all segment is followed by further segments.
    CatchAllNotLast { pattern: String },
    /// A segment constraint is not a valid regular expression.
    InvalidRegex { pattern: String, message: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Unbalanced { pattern } => {
                write!(f, "route pattern '{pattern}' has unbalanced brackets or parentheses")
            }
            PatternError::InvalidParamName { pattern, segment } => write!(
                f,
                "route pattern '{pattern}' has an invalid parameter segment '{segment}'"
            ),
            PatternError::CatchAllNotLast { pattern } => write!(
                f,
                "route pattern '{pattern}' has a catch-all segment that is not the last segment"
            ),
            PatternError::InvalidRegex { pattern, message } => {
                write!(f, "route pattern '{pattern}' does not compile: {message}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Segment classes, ordered from most to least specific.
///
/// Used to sort dynamic route tables so that `/blog/[slug]` is tried before
/// `/[...path]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SegmentKind {
    Literal,
    Dynamic,
    CatchAll,
    OptionalCatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Constraint(&'a str),
    Dynamic {
        name: &'a str,
        constraint: Option<&'a str>,
        optional: bool,
    },
    CatchAll {
        name: &'a str,
        constraint: Option<&'a str>,
        optional: bool,
    },
}

impl Segment<'_> {
    fn kind(&self) -> SegmentKind {
        match self {
            Segment::Literal(_) | Segment::Constraint(_) => SegmentKind::Literal,
            Segment::Dynamic { .. } => SegmentKind::Dynamic,
            Segment::CatchAll { optional: false, .. } => SegmentKind::CatchAll,
            Segment::CatchAll { optional: true, .. } => SegmentKind::OptionalCatchAll,
        }
    }
}

#[derive(Debug, Clone)]
struct Capture {
    group: String,
    name: Arc<str>,
    multi: bool,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    captures: Vec<Capture>,
    kinds: Vec<SegmentKind>,
    dynamic: bool,
}

impl RoutePattern {
    /// Compile a pattern written in either grammar.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for malformed segments or constraints.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let raw_segments = split_segments(pattern)?;
        let mut segments = Vec::with_capacity(raw_segments.len());
        for raw in raw_segments {
            segments.push(parse_segment(pattern, raw)?);
        }

        if let Some(pos) = segments
            .iter()
            .position(|s| matches!(s, Segment::CatchAll { .. }))
        {
            if pos + 1 != segments.len() {
                return Err(PatternError::CatchAllNotLast {
                    pattern: pattern.to_string(),
                });
            }
        }

        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        expr.push('^');
        let mut captures = Vec::new();
        for segment in &segments {
            match segment {
                Segment::Literal(lit) => {
                    expr.push('/');
                    expr.push_str(&regex::escape(lit));
                }
                Segment::Constraint(c) => {
                    expr.push_str("/(?:");
                    expr.push_str(c);
                    expr.push(')');
                }
                Segment::Dynamic {
                    name,
                    constraint,
                    optional,
                } => {
                    let group = format!("p{}", captures.len());
                    let inner = constraint.unwrap_or("[^/]+");
                    if *optional {
                        expr.push_str(&format!("(?:/(?P<{group}>(?:{inner})))?"));
                    } else {
                        expr.push_str(&format!("/(?P<{group}>(?:{inner}))"));
                    }
                    captures.push(Capture {
                        group,
                        name: Arc::from(*name),
                        multi: false,
                    });
                }
                Segment::CatchAll {
                    name,
                    constraint,
                    optional,
                } => {
                    let group = format!("p{}", captures.len());
                    let part = constraint.unwrap_or("[^/]+");
                    let body = format!("(?P<{group}>(?:{part})(?:/(?:{part}))*)");
                    if *optional {
                        expr.push_str(&format!("(?:/{body})?"));
                    } else {
                        expr.push('/');
                        expr.push_str(&body);
                    }
                    captures.push(Capture {
                        group,
                        name: Arc::from(*name),
                        multi: true,
                    });
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            captures,
            kinds: segments.iter().map(Segment::kind).collect(),
            dynamic: segments.iter().any(|s| !matches!(s, Segment::Literal(_))),
        })
    }

    /// The pattern text this matcher was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when any segment is dynamic (captured or constrained).
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Segment classes, used to order route tables by specificity.
    #[must_use]
    pub fn kinds(&self) -> &[SegmentKind] {
        &self.kinds
    }

    /// Match a concrete path. The whole path must be consumed.
    ///
    /// The path must not carry a query string.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        // "/" compiles to the empty body so patterns made only of optional
        // segments also match the root.
        let subject = if path == "/" { "" } else { path };
        let caps = self.regex.captures(subject)?;
        let mut params = Params::new();
        for capture in &self.captures {
            let Some(m) = caps.name(&capture.group) else {
                continue;
            };
            let value = if capture.multi {
                ParamValue::Multi(m.as_str().split('/').map(str::to_string).collect())
            } else {
                ParamValue::Single(m.as_str().to_string())
            };
            params.push(Arc::clone(&capture.name), value);
        }
        Some(params)
    }
}

/// Split on `/` outside of `(...)` and `[...]` so constraints may contain
/// slashes.
fn split_segments(pattern: &str) -> Result<Vec<&str>, PatternError> {
    let unbalanced = || PatternError::Unbalanced {
        pattern: pattern.to_string(),
    };
    let mut segments = Vec::new();
    let mut paren = 0usize;
    let mut bracket = 0usize;
    let mut escaped = false;
    let mut start = 0usize;
    for (i, c) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => paren += 1,
            ')' => paren = paren.checked_sub(1).ok_or_else(unbalanced)?,
            '[' if paren == 0 => bracket += 1,
            ']' if paren == 0 => bracket = bracket.checked_sub(1).ok_or_else(unbalanced)?,
            '/' if paren == 0 && bracket == 0 => {
                if i > start {
                    segments.push(&pattern[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if paren != 0 || bracket != 0 {
        return Err(unbalanced());
    }
    if start < pattern.len() {
        segments.push(&pattern[start..]);
    }
    Ok(segments)
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_segment<'a>(pattern: &str, raw: &'a str) -> Result<Segment<'a>, PatternError> {
    let invalid = || PatternError::InvalidParamName {
        pattern: pattern.to_string(),
        segment: raw.to_string(),
    };

    if let Some(inner) = raw.strip_prefix("[[").and_then(|s| s.strip_suffix("]]")) {
        let name = inner.strip_prefix("...").ok_or_else(invalid)?;
        if !is_param_name(name) {
            return Err(invalid());
        }
        return Ok(Segment::CatchAll {
            name,
            constraint: None,
            optional: true,
        });
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if let Some(name) = inner.strip_prefix("...") {
            if !is_param_name(name) {
                return Err(invalid());
            }
            return Ok(Segment::CatchAll {
                name,
                constraint: None,
                optional: false,
            });
        }
        let (name, constraint) = match inner.find('(') {
            Some(open) => {
                let constraint = inner[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
                (&inner[..open], Some(constraint))
            }
            None => (inner, None),
        };
        if !is_param_name(name) {
            return Err(invalid());
        }
        return Ok(Segment::Dynamic {
            name,
            constraint,
            optional: false,
        });
    }

    if let Some(rest) = raw.strip_prefix(':') {
        let name_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        if name.is_empty() {
            return Err(invalid());
        }
        let mut tail = &rest[name_len..];
        let mut constraint = None;
        if tail.starts_with('(') {
            let close = tail.rfind(')').ok_or_else(invalid)?;
            constraint = Some(&tail[1..close]);
            tail = &tail[close + 1..];
        }
        return match tail {
            "" => Ok(Segment::Dynamic {
                name,
                constraint,
                optional: false,
            }),
            "?" => Ok(Segment::Dynamic {
                name,
                constraint,
                optional: true,
            }),
            "+" => Ok(Segment::CatchAll {
                name,
                constraint,
                optional: false,
            }),
            "*" => Ok(Segment::CatchAll {
                name,
                constraint,
                optional: true,
            }),
            _ => Err(invalid()),
        };
    }

    if let Some(inner) = raw.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        return Ok(Segment::Constraint(inner));
    }

    Ok(Segment::Literal(raw))
}
