//! Request and response model shared by the cache store and the network client.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the request was initiated by the page.
///
/// Only `Navigate` changes routing; the other modes are carried through
/// so callers can describe what they are replaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full document load (address bar, link click, reload).
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// An outgoing request as seen by the cache worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

impl Request {
    /// A sub-resource GET.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, mode: RequestMode::NoCors }
    }

    /// A navigation GET.
    pub fn navigate(url: Url) -> Self {
        Self { method: "GET".to_string(), url, mode: RequestMode::Navigate }
    }

    pub fn with_method(mut self, method: impl AsRef<str>) -> Self {
        self.method = method.as_ref().to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A captured response: status, headers, and the full body.
///
/// The body is reference counted, so cloning a response to both persist
/// and return it does not copy the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
