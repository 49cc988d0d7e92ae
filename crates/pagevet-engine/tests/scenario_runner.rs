//! Runner and polling-assertion tests against a scripted mock driver.
//!
//! The mock stands in for the browser session: visibility flips after a
//! configured number of polls, text and attributes come from fixed tables,
//! and every call is recorded in shared state the test keeps a handle to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use pagevet_engine::{
    EngineError, PageDriver, POLL_INTERVAL, RunnerConfig, ScenarioRunner, await_visible,
};
use pagevet_models::{Scenario, ScenarioStep};

// ── Mock driver ──────────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    /// selector -> polls required before it reports visible
    visible_after: HashMap<String, usize>,
    poll_counts: HashMap<String, usize>,
    texts: Vec<String>,
    attributes: HashMap<(String, String), String>,
    calls: Vec<String>,
    screenshots: Vec<PathBuf>,
    fail_screenshot: bool,
    close_calls: usize,
}

#[derive(Clone, Default)]
struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    fn new() -> (Self, Arc<Mutex<MockState>>) {
        let driver = Self::default();
        let state = driver.state.clone();
        (driver, state)
    }

    fn with_visible(self, selector: &str, after_polls: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .visible_after
            .insert(selector.to_string(), after_polls);
        self
    }

    fn with_text(self, text: &str) -> Self {
        self.state.lock().unwrap().texts.push(text.to_string());
        self
    }

    fn with_attribute(self, selector: &str, name: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .attributes
            .insert((selector.to_string(), name.to_string()), value.to_string());
        self
    }

    fn failing_screenshots(self) -> Self {
        self.state.lock().unwrap().fail_screenshot = true;
        self
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> pagevet_engine::Result<()> {
        self.state.lock().unwrap().calls.push(format!("navigate:{url}"));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> pagevet_engine::Result<()> {
        self.state.lock().unwrap().calls.push(format!("click:{selector}"));
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> pagevet_engine::Result<()> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("fill:{selector}={value}"));
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> pagevet_engine::Result<()> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("select:{selector}={value}"));
        Ok(())
    }

    async fn is_visible(&mut self, selector: &str) -> pagevet_engine::Result<bool> {
        let mut state = self.state.lock().unwrap();
        let polls = state.poll_counts.entry(selector.to_string()).or_insert(0);
        *polls += 1;
        let polls = *polls;
        match state.visible_after.get(selector) {
            Some(after) => Ok(polls > *after),
            None => Ok(false),
        }
    }

    async fn text_present(&mut self, text: &str, _exact: bool) -> pagevet_engine::Result<bool> {
        Ok(self.state.lock().unwrap().texts.iter().any(|t| t == text))
    }

    async fn read_attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> pagevet_engine::Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .attributes
            .get(&(selector.to_string(), name.to_string()))
            .cloned())
    }

    async fn screenshot(&mut self, path: &Path) -> pagevet_engine::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_screenshot {
            return Err(EngineError::Io(std::io::Error::other("capture refused")));
        }
        state.calls.push(format!("screenshot:{}", path.display()));
        state.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> pagevet_engine::Result<()> {
        self.state.lock().unwrap().close_calls += 1;
        Ok(())
    }
}

fn runner_in(dir: &Path) -> ScenarioRunner {
    ScenarioRunner::new(RunnerConfig {
        evidence_dir: dir.to_path_buf(),
    })
}

// ── Runner behavior ──────────────────────────────────────────────────

#[tokio::test]
async fn passing_scenario_executes_all_steps_in_order() {
    let temp = tempfile::tempdir().unwrap();
    let (driver, state) = MockDriver::new();
    let driver = driver
        .with_visible("table.data-table", 0)
        .with_text("Guest");

    let scenario = Scenario {
        name: "users-tab".to_string(),
        steps: vec![
            ScenarioStep::Navigate {
                url: "http://localhost:3000/".to_string(),
            },
            ScenarioStep::Click {
                selector: "#users-tab".to_string(),
            },
            ScenarioStep::AssertVisible {
                selector: "table.data-table".to_string(),
                timeout_ms: 1_000,
            },
            ScenarioStep::AssertText {
                text: "Guest".to_string(),
                exact: true,
                timeout_ms: 1_000,
            },
            ScenarioStep::Screenshot {
                path: temp.path().join("users_tab.png"),
            },
        ],
    };

    let result = runner_in(temp.path()).run(driver, &scenario).await;

    assert!(result.passed(), "expected pass, got {:?}", result.error);
    assert_eq!(result.failed_step, None);
    assert_eq!(result.evidence, Some(temp.path().join("users_tab.png")));

    let state = state.lock().unwrap();
    assert_eq!(state.calls[0], "navigate:http://localhost:3000/");
    assert_eq!(state.calls[1], "click:#users-tab");
    assert!(state.calls[2].starts_with("screenshot:"));
    assert_eq!(state.close_calls, 1, "session must be closed on success");
}

#[tokio::test]
async fn failing_step_short_circuits_the_rest() {
    let temp = tempfile::tempdir().unwrap();
    let (driver, state) = MockDriver::new(); // nothing ever becomes visible

    let scenario = Scenario {
        name: "missing-cell".to_string(),
        steps: vec![
            ScenarioStep::Navigate {
                url: "http://localhost:3000/".to_string(),
            },
            ScenarioStep::AssertVisible {
                selector: ".never-there".to_string(),
                timeout_ms: 200,
            },
            ScenarioStep::Click {
                selector: "#after-failure".to_string(),
            },
        ],
    };

    let result = runner_in(temp.path()).run(driver, &scenario).await;

    assert!(!result.passed());
    assert_eq!(result.failed_step, Some(2));
    let error = result.error.unwrap();
    assert!(error.contains(".never-there"), "error was: {error}");
    assert!(error.contains("ms"), "error must state the wait: {error}");
    assert!(
        result.evidence.is_some(),
        "a failed run must carry evidence when capture succeeds"
    );

    let state = state.lock().unwrap();
    assert!(
        !state.calls.iter().any(|c| c == "click:#after-failure"),
        "steps after the failure must not run"
    );
    assert_eq!(state.close_calls, 1, "session must be closed on failure");
}

#[tokio::test]
async fn failure_message_references_assertion_target_and_wait() {
    let temp = tempfile::tempdir().unwrap();
    let (driver, _state) = MockDriver::new();

    let scenario = Scenario {
        name: "guest-cell".to_string(),
        steps: vec![ScenarioStep::AssertText {
            text: "Guest".to_string(),
            exact: true,
            timeout_ms: 250,
        }],
    };

    let result = runner_in(temp.path()).run(driver, &scenario).await;
    let error = result.error.unwrap();
    assert!(error.contains("Guest"), "error was: {error}");
    assert_eq!(result.failed_step, Some(1));
}

#[tokio::test]
async fn evidence_capture_failure_is_noted_not_masked() {
    let temp = tempfile::tempdir().unwrap();
    let (driver, state) = MockDriver::new();
    let driver = driver.failing_screenshots();

    let scenario = Scenario {
        name: "capture-refused".to_string(),
        steps: vec![ScenarioStep::AssertVisible {
            selector: "#gone".to_string(),
            timeout_ms: 150,
        }],
    };

    let result = runner_in(temp.path()).run(driver, &scenario).await;

    assert!(!result.passed());
    assert!(result.evidence.is_none());
    let error = result.error.unwrap();
    assert!(error.contains("#gone"), "original failure kept: {error}");
    assert!(
        error.contains("evidence capture failed"),
        "capture failure noted: {error}"
    );
    assert_eq!(state.lock().unwrap().close_calls, 1);
}

#[tokio::test]
async fn attribute_assertion_passes_against_expected_value() {
    let temp = tempfile::tempdir().unwrap();
    let (driver, _state) = MockDriver::new();
    let driver = driver.with_attribute("input[type=\"number\"]", "max", "1");

    let scenario = Scenario {
        name: "pagination-max".to_string(),
        steps: vec![ScenarioStep::AssertAttribute {
            selector: "input[type=\"number\"]".to_string(),
            name: "max".to_string(),
            expected: "1".to_string(),
            timeout_ms: 500,
        }],
    };

    let result = runner_in(temp.path()).run(driver, &scenario).await;
    assert!(result.passed(), "expected pass, got {:?}", result.error);
}

#[tokio::test]
async fn attribute_mismatch_fails_with_expected_value_in_message() {
    let temp = tempfile::tempdir().unwrap();
    let (driver, _state) = MockDriver::new();
    let driver = driver.with_attribute("input[type=\"number\"]", "max", "11");

    let scenario = Scenario {
        name: "pagination-max".to_string(),
        steps: vec![ScenarioStep::AssertAttribute {
            selector: "input[type=\"number\"]".to_string(),
            name: "max".to_string(),
            expected: "1".to_string(),
            timeout_ms: 200,
        }],
    };

    let result = runner_in(temp.path()).run(driver, &scenario).await;
    assert!(!result.passed());
    let error = result.error.unwrap();
    assert!(error.contains("max=1"), "error was: {error}");
}

#[tokio::test]
async fn driver_close_is_idempotent() {
    let (mut driver, state) = MockDriver::new();
    driver.close().await.unwrap();
    driver.close().await.unwrap();
    assert_eq!(state.lock().unwrap().close_calls, 2);
}

// ── Polling assertions ───────────────────────────────────────────────

#[tokio::test]
async fn await_visible_succeeds_once_condition_flips() {
    let (driver, state) = MockDriver::new();
    let mut driver = driver.with_visible("#late", 3);

    let start = Instant::now();
    await_visible(&mut driver, "#late", Duration::from_secs(2))
        .await
        .unwrap();

    assert!(
        state.lock().unwrap().poll_counts["#late"] >= 4,
        "must have re-polled"
    );
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn await_visible_never_exceeds_timeout_plus_one_interval() {
    let (mut driver, _state) = MockDriver::new();
    let timeout = Duration::from_millis(300);

    let start = Instant::now();
    let err = await_visible(&mut driver, "#never", timeout)
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match err {
        EngineError::AssertionTimeout { target, waited_ms } => {
            assert_eq!(target, "#never");
            assert!(waited_ms >= 300, "waited_ms was {waited_ms}");
        }
        other => panic!("expected AssertionTimeout, got {other:?}"),
    }
    assert!(
        elapsed < timeout + POLL_INTERVAL + Duration::from_millis(100),
        "poll loop overshot: {elapsed:?}"
    );
}

#[tokio::test]
async fn await_visible_checks_before_first_sleep() {
    let (driver, _state) = MockDriver::new();
    let mut driver = driver.with_visible("#instant", 0);

    let start = Instant::now();
    await_visible(&mut driver, "#instant", Duration::from_secs(5))
        .await
        .unwrap();

    assert!(
        start.elapsed() < POLL_INTERVAL,
        "an already-true condition must not wait a full interval"
    );
}
