//! Error types for repro-forge operations.
//!
//! Defines error types for the collaborator subsystems:
//! - LLM API interactions
//! - Paper acquisition, repository selection and cloning
//! - Repository inspection
//! - Demonstration synthesis
//!
//! The execution and scoring engines have no error type: every run they
//! attempt ends in an `ExecutionOutcome` / `ScoreReport`.

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: set REPRO_LLM_API_KEY or OPENAI_API_KEY")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

/// Errors raised while turning a paper reference into a cloned repository.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("No GitHub links found in the paper.")]
    NoRepositoryLinks,

    #[error("Failed to download paper from '{url}': {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to read paper '{path}': {reason}")]
    PaperUnreadable { path: String, reason: String },

    #[error("Failed to extract text from '{path}': {reason}")]
    TextExtraction { path: String, reason: String },

    #[error("Invalid repository reference '{0}'")]
    InvalidRepository(String),

    #[error("Failed to clone the selected repository '{url}': {stderr}")]
    CloneFailed { url: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the repository inspector.
#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("Repository path '{0}' is not a directory")]
    NotADirectory(String),

    #[error("Failed to walk repository: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Errors raised while obtaining a demonstration script.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Generation oracle unavailable: {0}")]
    Oracle(#[from] LlmError),

    #[error("Generation oracle returned an empty demonstration")]
    EmptyDemo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_messages_are_short() {
        assert_eq!(
            AcquisitionError::NoRepositoryLinks.to_string(),
            "No GitHub links found in the paper."
        );
        let err = AcquisitionError::CloneFailed {
            url: "https://github.com/a/b".to_string(),
            stderr: "fatal: repository not found".to_string(),
        };
        assert!(err.to_string().contains("fatal: repository not found"));

        let err = AcquisitionError::PaperUnreadable {
            path: "paper.pdf".to_string(),
            reason: "No such file or directory (os error 2)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read paper 'paper.pdf': No such file or directory (os error 2)"
        );
    }

    #[test]
    fn test_synthesis_wraps_llm_error() {
        let err: SynthesisError = LlmError::MissingApiKey.into();
        assert!(matches!(err, SynthesisError::Oracle(LlmError::MissingApiKey)));
        assert!(err.to_string().starts_with("Generation oracle unavailable"));
    }
}
