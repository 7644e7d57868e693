//! Cache-control policy for regenerated pages.
//!
//! Every value has the shape `public, max-age=0, s-maxage=<n>[, must-revalidate]`:
//! browsers always revalidate and only the edge cache holds the object.
//!
//! | Case | `s-maxage` | `must-revalidate` |
//! |---|---|---|
//! | never regenerate | long TTL | yes |
//! | fresh (expiry ahead) | seconds until expiry, floored | no |
//! | stale, or just regenerated over a placeholder | 0 | yes |

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use http::header::{self, HeaderMap};
use std::fmt;

use crate::manifest::Revalidate;

/// 31 days.
pub const DEFAULT_LONG_TTL_SECS: u64 = 2_678_400;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheControl {
    pub s_maxage: u64,
    pub must_revalidate: bool,
}

impl CacheControl {
    /// Content that never regenerates.
    #[must_use]
    pub fn immutable(long_ttl_secs: u64) -> Self {
        Self {
            s_maxage: long_ttl_secs,
            must_revalidate: true,
        }
    }

    /// Force the edge to refetch on the next request.
    #[must_use]
    pub fn revalidate_now() -> Self {
        Self {
            s_maxage: 0,
            must_revalidate: true,
        }
    }

    #[must_use]
    pub fn fresh(remaining_secs: u64) -> Self {
        Self {
            s_maxage: remaining_secs,
            must_revalidate: false,
        }
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.s_maxage == 0 && self.must_revalidate
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "public, max-age=0, s-maxage={}", self.s_maxage)?;
        if self.must_revalidate {
            f.write_str(", must-revalidate")?;
        }
        Ok(())
    }
}

/// Parse an HTTP date (`Wed, 21 Apr 2021 04:47:27 GMT`).
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[must_use]
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

pub(crate) fn add_secs(at: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::try_seconds(i64::try_from(secs).ok()?)?;
    at.checked_add_signed(delta)
}

/// Freshness metadata found on an existing object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Freshness {
    pub expires: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Freshness {
    /// Read `Expires` and `Last-Modified`. Unparseable dates are ignored.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let date = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_http_date)
        };
        Self {
            expires: date(header::EXPIRES),
            last_modified: date(header::LAST_MODIFIED),
        }
    }
}

/// Cache control and expiry to store with a freshly rendered artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactFreshness {
    pub cache_control: Option<CacheControl>,
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub long_ttl_secs: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            long_ttl_secs: DEFAULT_LONG_TTL_SECS,
        }
    }
}

impl CachePolicy {
    #[must_use]
    pub fn new(long_ttl_secs: u64) -> Self {
        Self { long_ttl_secs }
    }

    /// Cache control for an object served from the edge's origin.
    ///
    /// `revalidate` is `None` when the route has no prerender metadata. The
    /// expiry is `Expires`, else `Last-Modified` plus the window. `None` is
    /// returned when neither the window nor an expiry is known.
    #[must_use]
    pub fn cache_control(
        &self,
        revalidate: Option<Revalidate>,
        freshness: &Freshness,
        now: DateTime<Utc>,
    ) -> Option<CacheControl> {
        if revalidate == Some(Revalidate::Never) {
            return Some(CacheControl::immutable(self.long_ttl_secs));
        }
        let window = revalidate.and_then(Revalidate::seconds);
        let expires_at = freshness
            .expires
            .or_else(|| add_secs(freshness.last_modified?, window?))
            .or_else(|| add_secs(now, window?))?;

        let remaining = (expires_at - now).num_seconds();
        Some(match u64::try_from(remaining) {
            Ok(secs) if secs > 0 => CacheControl::fresh(secs),
            _ => CacheControl::revalidate_now(),
        })
    }

    /// Freshness to persist with a newly rendered artifact.
    ///
    /// Never-regenerating artifacts get the long TTL and no expiry; others
    /// expire `revalidate` seconds from `now`.
    #[must_use]
    pub fn for_artifact(&self, revalidate: Revalidate, now: DateTime<Utc>) -> ArtifactFreshness {
        match revalidate {
            Revalidate::Never => ArtifactFreshness {
                cache_control: Some(CacheControl::immutable(self.long_ttl_secs)),
                expires: None,
            },
            Revalidate::After(secs) => ArtifactFreshness {
                cache_control: None,
                expires: add_secs(now, secs),
            },
        }
    }
}
