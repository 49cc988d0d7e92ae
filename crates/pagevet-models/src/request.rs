//! Read-only view of an intercepted browser request.

use serde::{Deserialize, Serialize};

/// The request data exposed to route matching and dynamic responders.
///
/// Responders receive this by reference and cannot influence the request
/// itself; matched requests never reach a real network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedRequest {
    /// Full URL as issued by the browser.
    pub url: String,
    /// HTTP method, uppercase.
    pub method: String,
    /// URL path component, starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`, if any.
    pub query: Option<String>,
    /// Decoded query parameters in document order.
    pub params: Vec<(String, String)>,
}

impl InterceptedRequest {
    /// Build a request view from a browser-issued URL.
    ///
    /// URLs the browser emits are absolute; anything unparseable falls back
    /// to a path-only view so route matching still sees the raw string.
    pub fn parse(url: &str, method: &str) -> Self {
        match url::Url::parse(url) {
            Ok(parsed) => Self {
                url: url.to_string(),
                method: method.to_uppercase(),
                path: parsed.path().to_string(),
                query: parsed.query().map(str::to_string),
                params: parsed
                    .query_pairs()
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect(),
            },
            Err(_) => Self {
                url: url.to_string(),
                method: method.to_uppercase(),
                path: url.to_string(),
                query: None,
                params: Vec::new(),
            },
        }
    }

    /// First value of the named query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}
