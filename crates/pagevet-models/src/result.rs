//! Outcome of a scenario run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
}

/// Produced exactly once per run by the scenario runner; immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub status: RunStatus,
    /// 1-based index of the failing step, if any.
    pub failed_step: Option<usize>,
    /// Single-line reason for the failure, if any.
    pub error: Option<String>,
    /// Screenshot captured as evidence: the failure capture on a failed run,
    /// or the last explicit screenshot step on a passed run.
    pub evidence: Option<PathBuf>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.status == RunStatus::Passed
    }
}
