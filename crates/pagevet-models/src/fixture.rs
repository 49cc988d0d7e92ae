//! Canned network responses substituted for real backend calls.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Body of a fixture response.
///
/// Text bodies keep scenario files readable (the common case is a JSON
/// payload authored inline); binary bodies are expressed as base64 so the
/// exact bytes a real backend would send remain representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureBody {
    Text(String),
    Binary { base64: String },
}

impl FixtureBody {
    /// The exact bytes handed to the browser for this body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::Binary { base64 } => BASE64.decode(base64),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary { base64 } => base64.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for FixtureBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FixtureBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A canned response: the status, content type, and body the browser
/// receives in place of a real network round trip.
///
/// Immutable once registered for a scenario run; scenarios that need varying
/// data register distinct fixtures or a dynamic responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureResponse {
    pub status: u16,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub body: FixtureBody,
}

impl FixtureResponse {
    /// A `200 application/json` fixture, the overwhelmingly common case.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: default_content_type(),
            body: FixtureBody::Text(body.into()),
        }
    }

    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<FixtureBody>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}
