//! Sequential scenario execution with evidence capture.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use pagevet_models::{RunStatus, Scenario, ScenarioResult, ScenarioStep};

use crate::driver::PageDriver;
use crate::error::Result;
use crate::waits;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory failure screenshots are written into.
    pub evidence_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            evidence_dir: PathBuf::from("evidence"),
        }
    }
}

/// Executes scenarios step by step against a page driver.
///
/// Steps run strictly sequentially in declaration order; the first failing
/// step short-circuits the rest. A run is not re-entrant on one driver: the
/// caller supplies a fresh session per run, and the runner closes it on every
/// exit path.
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub async fn run<D: PageDriver>(&self, mut driver: D, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "running scenario");

        let mut last_screenshot: Option<PathBuf> = None;
        let mut failure: Option<(usize, String)> = None;

        for (index, step) in scenario.steps.iter().enumerate() {
            let step_number = index + 1;
            debug!(step = step_number, kind = step.label(), "executing step");

            match execute_step(&mut driver, step).await {
                Ok(()) => {
                    if let ScenarioStep::Screenshot { path } = step {
                        last_screenshot = Some(path.clone());
                    }
                }
                Err(err) => {
                    warn!(scenario = %scenario.name, step = step_number, kind = step.label(), error = %err, "step failed");
                    failure = Some((step_number, format!("{} failed: {err}", step.label())));
                    break;
                }
            }
        }

        let result = match failure {
            None => {
                info!(scenario = %scenario.name, "scenario passed");
                ScenarioResult {
                    scenario: scenario.name.clone(),
                    status: RunStatus::Passed,
                    failed_step: None,
                    error: None,
                    evidence: last_screenshot,
                    duration_ms: started.elapsed().as_millis() as u64,
                    finished_at: Utc::now(),
                }
            }
            Some((step, message)) => {
                let (evidence, message) = self
                    .capture_failure_evidence(&mut driver, &scenario.name, step, message)
                    .await;
                ScenarioResult {
                    scenario: scenario.name.clone(),
                    status: RunStatus::Failed,
                    failed_step: Some(step),
                    error: Some(message),
                    evidence,
                    duration_ms: started.elapsed().as_millis() as u64,
                    finished_at: Utc::now(),
                }
            }
        };

        if let Err(err) = driver.close().await {
            warn!(scenario = %scenario.name, error = %err, "failed to close browser session");
        }

        result
    }

    /// Best-effort failure screenshot. A capture failure is noted in the
    /// returned message but never masks the original step failure.
    async fn capture_failure_evidence<D: PageDriver>(
        &self,
        driver: &mut D,
        scenario: &str,
        step: usize,
        message: String,
    ) -> (Option<PathBuf>, String) {
        let path = self
            .config
            .evidence_dir
            .join(format!("{}-step{step}-failure.png", slug(scenario)));

        if let Err(err) = std::fs::create_dir_all(&self.config.evidence_dir) {
            warn!(dir = %self.config.evidence_dir.display(), error = %err, "could not create evidence directory");
            return (None, format!("{message} (evidence capture failed: {err})"));
        }

        match driver.screenshot(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "captured failure evidence");
                (Some(path), message)
            }
            Err(err) => {
                warn!(error = %err, "evidence capture failed");
                (None, format!("{message} (evidence capture failed: {err})"))
            }
        }
    }
}

async fn execute_step<D: PageDriver>(driver: &mut D, step: &ScenarioStep) -> Result<()> {
    match step {
        ScenarioStep::Navigate { url } => driver.navigate(url).await,
        ScenarioStep::Click { selector } => driver.click(selector).await,
        ScenarioStep::Fill { selector, value } => driver.fill(selector, value).await,
        ScenarioStep::SelectOption { selector, value } => {
            driver.select_option(selector, value).await
        }
        ScenarioStep::AssertVisible {
            selector,
            timeout_ms,
        } => waits::await_visible(driver, selector, Duration::from_millis(*timeout_ms)).await,
        ScenarioStep::AssertText {
            text,
            exact,
            timeout_ms,
        } => waits::await_text(driver, text, *exact, Duration::from_millis(*timeout_ms)).await,
        ScenarioStep::AssertAttribute {
            selector,
            name,
            expected,
            timeout_ms,
        } => {
            waits::await_attribute(
                driver,
                selector,
                name,
                expected,
                Duration::from_millis(*timeout_ms),
            )
            .await
        }
        ScenarioStep::Screenshot { path } => driver.screenshot(path).await,
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
