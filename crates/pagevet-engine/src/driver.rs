//! Seam between the scenario runner and the live browser.
//!
//! The runner and the polling assertions are generic over this trait so the
//! engine's control flow is testable without a Chromium process; `Session`
//! is the production implementation.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Page operations a scenario run needs. One driver instance corresponds to
/// one exclusive browser page; drivers are never shared across runs.
#[async_trait]
pub trait PageDriver: Send {
    /// Load a URL and return once the document has finished loading.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Click the first element matching the CSS selector.
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Replace the value of an input or textarea.
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Choose an option of a `<select>` by value.
    async fn select_option(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Whether the element currently exists and is rendered visible.
    async fn is_visible(&mut self, selector: &str) -> Result<bool>;

    /// Whether the text is currently rendered; `exact` requires a visible
    /// element whose entire content equals the text.
    async fn text_present(&mut self, text: &str, exact: bool) -> Result<bool>;

    /// Current value of an attribute, or `None` if the element or attribute
    /// is absent.
    async fn read_attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Capture a screenshot of the viewport to `path`, overwriting.
    async fn screenshot(&mut self, path: &Path) -> Result<()>;

    /// Release the underlying browser resources. Idempotent: a second call
    /// is a no-op.
    async fn close(&mut self) -> Result<()>;
}
