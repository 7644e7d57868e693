use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tracing::warn;

use crate::router::Params;
use crate::rules::Redirect;

/// The outcome of resolving one request. Exactly one is produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RouteResult {
    /// Serve a file from the public directory verbatim.
    PublicFile { file: String },
    /// Serve a prebuilt page or data file with the given status.
    Static {
        file: String,
        status_code: u16,
        is_data: bool,
    },
    /// Render `page` on demand.
    Render {
        page: String,
        params: Params,
        is_data: bool,
        querystring: Option<String>,
    },
    /// Invoke the API handler `page`. The resolver writes no response.
    ApiInvoke {
        page: String,
        params: Params,
        querystring: Option<String>,
    },
    /// Terminal redirect, already written to the response.
    Redirect { status_code: u16, location: String },
    /// Proxy to an absolute `http(s)` URL.
    External { url: String },
    /// Basic auth failed; 401 already written.
    Unauthorized,
    /// API flow only: bare 404 already written.
    NotFound,
}

impl RouteResult {
    #[must_use]
    pub fn static_file(file: impl Into<String>) -> Self {
        RouteResult::Static {
            file: file.into(),
            status_code: 200,
            is_data: false,
        }
    }

    /// True when the response is complete and nothing is left to serve.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RouteResult::Redirect { .. } | RouteResult::Unauthorized | RouteResult::NotFound
        )
    }
}

impl From<Redirect> for RouteResult {
    fn from(redirect: Redirect) -> Self {
        RouteResult::Redirect {
            status_code: redirect.status_code,
            location: redirect.location,
        }
    }
}

/// Inbound request: path, query and headers. The method is irrelevant.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Path without the query string.
    pub uri: String,
    pub querystring: Option<String>,
    pub headers: HeaderMap,
}

impl Request {
    /// Split `url` into path and query string.
    #[must_use]
    pub fn new(url: &str) -> Self {
        let (uri, querystring) = match url.split_once('?') {
            Some((uri, query)) => (uri, Some(query.to_string())),
            None => (url, None),
        };
        Self {
            uri: if uri.is_empty() { "/".to_string() } else { uri.to_string() },
            querystring: querystring.filter(|q| !q.is_empty()),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header. Invalid names or values are logged and skipped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid request header"),
        }
        self
    }

    #[must_use]
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header(header::HOST)
    }
}

/// Outgoing response sink. At most one terminal action is taken; writes after
/// [`Response::end`] are ignored.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    ended: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: None,
            ended: false,
        }
    }
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn writable(&self, what: &str) -> bool {
        if self.ended {
            warn!(action = what, "Ignoring write to an ended response");
        }
        !self.ended
    }

    pub fn set_status(&mut self, status: u16) {
        if self.writable("status") {
            self.status = status;
        }
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.writable("header") {
            self.headers.insert(name, value);
        }
    }

    /// Add a header value, keeping earlier values of the same name.
    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.writable("header") {
            self.headers.append(name, value);
        }
    }

    /// Set a header from a static name and a value that may be invalid.
    pub fn set_header_str(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => self.set_header(name, value),
            Err(_) => warn!(header = %name, "Skipping header with invalid value"),
        }
    }

    pub fn write_body(&mut self, body: impl Into<Vec<u8>>) {
        if self.writable("body") {
            self.body = Some(body.into());
        }
    }

    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Write a redirect and end the response.
    pub fn redirect(&mut self, status_code: u16, location: &str) {
        self.set_status(status_code);
        self.set_header_str(header::LOCATION, location);
        self.end();
    }

    /// Write a basic-auth challenge and end the response.
    pub fn unauthorized(&mut self) {
        self.set_status(401);
        self.set_header(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"Protected\""),
        );
        self.write_body("Unauthorized");
        self.end();
    }
}

/// One request paired with its response sink.
#[derive(Debug, Clone, Default)]
pub struct Event {
    pub request: Request,
    pub response: Response,
}

impl Event {
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::new(),
        }
    }
}
