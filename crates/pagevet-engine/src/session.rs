//! Chromium session controller.
//!
//! Owns the browser process, the CDP handler loop, and the route-interception
//! task for exactly one scenario run. Interception is installed before any
//! navigation can happen; requests issued earlier would bypass the fixtures
//! and fail non-deterministically.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
    FulfillRequestParams, HeaderEntry,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pagevet_models::InterceptedRequest;

use crate::driver::PageDriver;
use crate::error::{EngineError, Result};
use crate::routes::RouteRegistry;
use crate::waits::POLL_INTERVAL;

const INTERACTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub viewport: (u32, u32),
    pub navigation_timeout: Duration,
    /// Fail requests no route matches instead of letting them reach the
    /// network. Off by default so the dev server can still serve the page
    /// shell itself.
    pub block_unmatched: bool,
    /// Chrome/Chromium executable override; falls back to auto-detection.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: (1280, 720),
            navigation_timeout: Duration::from_secs(30),
            block_unmatched: false,
            chrome_executable: std::env::var_os("PAGEVET_CHROME").map(PathBuf::from),
        }
    }
}

/// One browser context plus the interception task that feeds it fixtures.
///
/// The route registry moves into the session at `start` and lives exactly as
/// long as the session; `close` is idempotent and releases everything.
pub struct Session {
    id: String,
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    intercept_task: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
}

impl Session {
    /// Launch a browser and install the registry's interception hook before
    /// any navigation occurs.
    pub async fn start(config: SessionConfig, registry: RouteRegistry) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(config.viewport.0, config.viewport.1);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(EngineError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("cdp handler loop ended");
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        page.execute(EnableParams::default()).await?;

        let intercept_page = page.clone();
        let block_unmatched = config.block_unmatched;
        let rules = registry.len();
        let intercept_task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                handle_paused_request(&intercept_page, &registry, block_unmatched, &event).await;
            }
        });

        let id = Uuid::new_v4().to_string();
        info!(session = %id, rules, "browser session started");

        Ok(Self {
            id,
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            intercept_task: Some(intercept_task),
            navigation_timeout: config.navigation_timeout,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or(EngineError::SessionClosed)
    }

    /// Wait for an element to exist and return a handle to it.
    ///
    /// Polls until the interaction timeout elapses, so locating right after
    /// navigation tolerates async rendering.
    pub async fn locate(&self, selector: &str) -> Result<Element> {
        let page = self.page()?;
        let start = Instant::now();
        loop {
            match page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(_) if start.elapsed() < INTERACTION_TIMEOUT => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(_) => {
                    return Err(EngineError::ElementNotFound {
                        selector: selector.to_string(),
                        waited_ms: start.elapsed().as_millis() as u64,
                    });
                }
            }
        }
    }

    async fn eval_bool(&self, script: String) -> Result<bool> {
        let page = self.page()?;
        Ok(page.evaluate(script).await?.into_value().unwrap_or(false))
    }
}

/// Answer one paused request: fulfill from the winning route, or continue or
/// block it when nothing matches.
async fn handle_paused_request(
    page: &Page,
    registry: &RouteRegistry,
    block_unmatched: bool,
    event: &EventRequestPaused,
) {
    let request = InterceptedRequest::parse(&event.request.url, &event.request.method);

    match registry.resolve(&request) {
        Some(fixture) => {
            let body = match fixture.body.to_bytes() {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(url = %request.url, error = %err, "fixture body is not valid base64; failing request");
                    fail_request(page, event, ErrorReason::Failed).await;
                    return;
                }
            };
            debug!(url = %request.url, status = fixture.status, bytes = body.len(), "fulfilling request from fixture");

            let params = FulfillRequestParams::builder()
                .request_id(event.request_id.clone())
                .response_code(i64::from(fixture.status))
                .response_header(HeaderEntry {
                    name: "Content-Type".to_string(),
                    value: fixture.content_type.clone(),
                })
                .body(BASE64.encode(body))
                .build();
            match params {
                Ok(params) => {
                    if let Err(err) = page.execute(params).await {
                        warn!(url = %request.url, error = %err, "failed to fulfill intercepted request");
                    }
                }
                Err(reason) => warn!(url = %request.url, %reason, "could not build fulfill command"),
            }
        }
        None if block_unmatched => {
            debug!(url = %request.url, "blocking unmatched request");
            fail_request(page, event, ErrorReason::BlockedByClient).await;
        }
        None => {
            if let Err(err) = page
                .execute(ContinueRequestParams::new(event.request_id.clone()))
                .await
            {
                warn!(url = %request.url, error = %err, "failed to continue unmatched request");
            }
        }
    }
}

async fn fail_request(page: &Page, event: &EventRequestPaused, reason: ErrorReason) {
    if let Err(err) = page
        .execute(FailRequestParams::new(event.request_id.clone(), reason))
        .await
    {
        warn!(error = %err, "failed to fail intercepted request");
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl PageDriver for Session {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let nav_timeout = self.navigation_timeout;
        let page = self.page()?;
        let start = Instant::now();
        debug!(url, "navigating");

        match timeout(nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                return Err(EngineError::NavigationTimeout {
                    url: url.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
        }

        // goto resolves on the navigation response; the document itself may
        // still be loading.
        loop {
            let state: String = page
                .evaluate("document.readyState")
                .await?
                .into_value()
                .unwrap_or_default();
            if state == "complete" {
                return Ok(());
            }
            if start.elapsed() >= nav_timeout {
                return Err(EngineError::NavigationTimeout {
                    url: url.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self.locate(selector).await?;
        element.click().await?;
        // let the frontend react before the next step queries the DOM
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        // Value is set via the DOM with input/change events dispatched;
        // framework-controlled inputs do not observe raw keystrokes reliably.
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.focus();
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            selector = js_string(selector),
            value = js_string(value),
        );
        if self.eval_bool(script).await? {
            Ok(())
        } else {
            Err(EngineError::ElementNotFound {
                selector: selector.to_string(),
                waited_ms: 0,
            })
        }
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return 'missing';
                el.value = {value};
                if (el.value !== {value}) return 'nomatch';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'set';
            }})()"#,
            selector = js_string(selector),
            value = js_string(value),
        );
        let page = self.page()?;
        let outcome: String = page.evaluate(script).await?.into_value().unwrap_or_default();
        match outcome.as_str() {
            "set" => Ok(()),
            "nomatch" => Err(EngineError::OptionNotFound {
                selector: selector.to_string(),
                value: value.to_string(),
            }),
            _ => Err(EngineError::ElementNotFound {
                selector: selector.to_string(),
                waited_ms: 0,
            }),
        }
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }})()"#,
            selector = js_string(selector),
        );
        self.eval_bool(script).await
    }

    async fn text_present(&mut self, text: &str, exact: bool) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const needle = {needle};
                if (!{exact}) {{
                    return (document.body ? document.body.innerText : '').includes(needle);
                }}
                for (const el of document.querySelectorAll('*')) {{
                    if (el.children.length > 0) continue;
                    if ((el.textContent || '').trim() !== needle) continue;
                    const rect = el.getBoundingClientRect();
                    if (rect.width > 0 && rect.height > 0) return true;
                }}
                return false;
            }})()"#,
            needle = js_string(text),
            exact = exact,
        );
        self.eval_bool(script).await
    }

    async fn read_attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                return el ? el.getAttribute({name}) : null;
            }})()"#,
            selector = js_string(selector),
            name = js_string(name),
        );
        let page = self.page()?;
        Ok(page.evaluate(script).await?.into_value().unwrap_or(None))
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        let page = self.page()?;
        let bytes = page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!(path = %path.display(), "screenshot written");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(task) = self.intercept_task.take() {
            task.abort();
        }
        self.page.take();
        if let Some(mut browser) = self.browser.take() {
            if let Err(err) = browser.close().await {
                warn!(session = %self.id, error = %err, "error closing browser");
            }
            info!(session = %self.id, "browser session closed");
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.browser.is_some() {
            // chromiumoxide tears the child process down when the handle
            // drops; explicit close() is still the expected path.
            debug!(session = %self.id, "session dropped without explicit close");
        }
    }
}
