//! The pipeline run record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::acquisition::RepoRef;
use crate::execution::ExecutionOutcome;
use crate::inspector::Summary;
use crate::scoring::ScoreReport;

/// Lifecycle of a run. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Success,
    Failed,
}

impl RunStatus {
    /// Returns true for `Success` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::InProgress)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::InProgress => write!(f, "in_progress"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Everything one pipeline run produced.
///
/// Stage fields stay `None` (and are omitted from JSON) until their stage
/// runs, so "not reached" is distinguishable from "ran and was empty".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique identifier for this run.
    pub run_id: String,
    /// Paper URL or path the run started from.
    pub input_ref: String,
    pub status: RunStatus,
    /// Recorded failures, in order.
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Every repository the paper mentions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_refs: Option<Vec<RepoRef>>,
    /// The repository selected for evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_file_path: Option<PathBuf>,
    /// Hex SHA-256 of the persisted demonstration file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreReport>,
}

impl PipelineRun {
    /// Starts a new run in `InProgress`.
    pub fn new(input_ref: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            input_ref: input_ref.into(),
            status: RunStatus::InProgress,
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            repo_refs: None,
            repository: None,
            local_path: None,
            summary: None,
            demo_source: None,
            demo_file_path: None,
            demo_sha256: None,
            execution: None,
            score: None,
        }
    }

    /// Marks the run successful. No effect once terminal.
    pub fn succeed(&mut self) {
        self.finish(RunStatus::Success);
    }

    /// Records `error` and marks the run failed. No effect once terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.errors.push(error.into());
        self.finish(RunStatus::Failed);
    }

    fn finish(&mut self, status: RunStatus) {
        if self.status.is_terminal() {
            tracing::warn!(run_id = %self.run_id, current = %self.status, requested = %status, "Ignoring transition out of terminal state");
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Process exit code for this run: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Success => 0,
            RunStatus::InProgress | RunStatus::Failed => 1,
        }
    }
}
