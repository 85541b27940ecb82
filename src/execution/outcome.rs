//! Execution outcome record.

use serde::{Deserialize, Serialize};

/// Message recorded when the demonstration file is missing at execution time.
pub const FILE_NOT_FOUND_MESSAGE: &str = "Demo file not found for execution.";

/// Classification of a single demonstration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Source failed the static check; no process was spawned.
    SyntaxError,
    /// Demonstration file was missing; no process was spawned.
    FileNotFound,
    /// The process ran to completion (any exit code).
    Completed,
    /// The process exceeded its deadline and was killed.
    TimedOut,
    /// The process (or the checker) could not be spawned.
    SetupError,
}

impl ExecutionStatus {
    /// Returns true if a demonstration process actually ran and produced streams.
    pub fn process_ran(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::TimedOut)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::SyntaxError => write!(f, "syntax_error"),
            ExecutionStatus::FileNotFound => write!(f, "file_not_found"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::TimedOut => write!(f, "timed_out"),
            ExecutionStatus::SetupError => write!(f, "setup_error"),
        }
    }
}

/// Result of one execution attempt. Created fresh per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// How the attempt ended.
    pub status: ExecutionStatus,
    /// Process exit code; only meaningful when `status` is `Completed`.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or the engine's diagnostic.
    pub stderr: String,
    /// Wall-clock seconds, rounded to two decimals.
    pub elapsed_seconds: f64,
}

impl ExecutionOutcome {
    /// Static check failed; nothing was spawned.
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::not_run(ExecutionStatus::SyntaxError, message)
    }

    /// The demonstration file does not exist.
    pub fn file_not_found() -> Self {
        Self::not_run(ExecutionStatus::FileNotFound, FILE_NOT_FOUND_MESSAGE)
    }

    /// A process could not be started.
    pub fn setup_error(message: impl Into<String>) -> Self {
        Self::not_run(ExecutionStatus::SetupError, message)
    }

    /// The process ran to completion.
    pub fn completed(exit_code: i32, stdout: String, stderr: String, elapsed_seconds: f64) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            exit_code,
            stdout,
            stderr,
            elapsed_seconds: round_seconds(elapsed_seconds),
        }
    }

    /// The deadline expired; `partial_stdout` is whatever was read before the kill.
    pub fn timed_out(partial_stdout: String, message: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            status: ExecutionStatus::TimedOut,
            exit_code: 1,
            stdout: partial_stdout,
            stderr: message.into(),
            elapsed_seconds: round_seconds(elapsed_seconds),
        }
    }

    fn not_run(status: ExecutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            exit_code: 1,
            stdout: String::new(),
            stderr: message.into(),
            elapsed_seconds: 0.0,
        }
    }

    /// Returns true if the process completed with exit code 0.
    pub fn is_clean_exit(&self) -> bool {
        self.status == ExecutionStatus::Completed && self.exit_code == 0
    }
}

fn round_seconds(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 100.0).round() / 100.0
    } else {
        0.0
    }
}
