//! Engine error taxonomy.
//!
//! Registration-time errors (`InvalidPattern`, `FixtureNotFound`) signal a
//! misconfigured harness and propagate immediately. Step-level errors are
//! caught by the scenario runner and converted into a structured failure
//! result; they never cross the runner boundary as raw errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("fixture not found: {0}")]
    FixtureNotFound(String),

    #[error("navigation to {url} did not reach loaded state within {waited_ms}ms")]
    NavigationTimeout { url: String, waited_ms: u64 },

    #[error("condition `{target}` did not hold within {waited_ms}ms")]
    AssertionTimeout { target: String, waited_ms: u64 },

    #[error("no element matched `{selector}` within {waited_ms}ms")]
    ElementNotFound { selector: String, waited_ms: u64 },

    #[error("select `{selector}` has no option with value `{value}`")]
    OptionNotFound { selector: String, value: String },

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("session already closed")]
    SessionClosed,

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
