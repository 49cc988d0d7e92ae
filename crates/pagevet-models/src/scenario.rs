//! Scenario steps and the authorable scenario-file format.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fixture::FixtureResponse;

pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 5_000;

/// One step of a scenario. Declaration order is execution order; the runner
/// never reorders or overlaps steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Load a URL and wait for the document to finish loading.
    Navigate { url: String },
    /// Click the first element matching a CSS selector.
    Click { selector: String },
    /// Replace the value of an input or textarea.
    Fill { selector: String, value: String },
    /// Choose an option of a `<select>` by value.
    SelectOption { selector: String, value: String },
    /// Poll until the element is visible or the timeout elapses.
    AssertVisible {
        selector: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Poll until the text is rendered. With `exact` the text must be the
    /// entire content of a visible element, not a substring anywhere.
    AssertText {
        text: String,
        #[serde(default)]
        exact: bool,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Poll until the element's attribute equals the expected value.
    AssertAttribute {
        selector: String,
        name: String,
        expected: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    /// Capture a screenshot to the given path, overwriting prior captures.
    Screenshot { path: PathBuf },
}

impl ScenarioStep {
    /// Short kind label used in logs and failure messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::SelectOption { .. } => "select_option",
            Self::AssertVisible { .. } => "assert_visible",
            Self::AssertText { .. } => "assert_text",
            Self::AssertAttribute { .. } => "assert_attribute",
            Self::Screenshot { .. } => "screenshot",
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_STEP_TIMEOUT_MS
}

/// A named, ordered step sequence executed against one browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<ScenarioStep>,
}

/// Binds a route pattern to a named fixture from the scenario's fixture map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteBinding {
    pub pattern: String,
    pub fixture: String,
}

/// The on-disk scenario format: fixtures, route bindings, and steps bundled
/// into one JSON document so a verification run is a single self-contained
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub name: String,
    #[serde(default)]
    pub fixtures: BTreeMap<String, FixtureResponse>,
    #[serde(default)]
    pub routes: Vec<RouteBinding>,
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioFile {
    pub fn scenario(&self) -> Scenario {
        Scenario {
            name: self.name.clone(),
            steps: self.steps.clone(),
        }
    }
}
