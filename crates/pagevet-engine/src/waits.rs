//! Polling assertions over a page driver.
//!
//! Each wait re-queries the page at a fixed interval until the condition
//! holds or the timeout elapses. A timeout is always surfaced as a typed
//! error carrying the elapsed wait, never swallowed.

use std::time::{Duration, Instant};

use crate::driver::PageDriver;
use crate::error::{EngineError, Result};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait until the element is visible.
pub async fn await_visible<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &str,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        if driver.is_visible(selector).await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(timed_out(selector, start));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until the text is rendered; `exact` requires a visible element whose
/// entire content equals the text, so overlapping labels ("Search" vs
/// "Search Database") cannot satisfy each other's assertions.
pub async fn await_text<D: PageDriver + ?Sized>(
    driver: &mut D,
    text: &str,
    exact: bool,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        if driver.text_present(text, exact).await? {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(timed_out(text, start));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until the element's attribute equals the expected value.
pub async fn await_attribute<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &str,
    name: &str,
    expected: &str,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        if driver.read_attribute(selector, name).await?.as_deref() == Some(expected) {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(timed_out(&format!("{selector}[{name}={expected}]"), start));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn timed_out(target: &str, start: Instant) -> EngineError {
    EngineError::AssertionTimeout {
        target: target.to_string(),
        waited_ms: start.elapsed().as_millis() as u64,
    }
}
