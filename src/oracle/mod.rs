//! Capability interfaces for the generative and judgment oracles.
//!
//! The rest of the forge talks to language models only through the two
//! narrow traits defined here:
//!
//! - [`DemoOracle`]: "is this an existing runnable demo?" (yes/no) and
//!   "write a new demo" (raw source text).
//! - [`JudgmentOracle`]: a bounded integer assessment of a demonstration.
//!
//! Prompt wording and response formatting stay inside [`LlmOracle`].

mod llm_oracle;
pub mod prompts;

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::error::LlmError;
use crate::execution::ExecutionOutcome;
use crate::inspector::Summary;

pub use llm_oracle::{strip_code_fences, LlmOracle};

/// Errors returned by a judgment oracle.
#[derive(Debug, Error)]
pub enum JudgmentError {
    /// The oracle could not be reached (credentials, transport, quota).
    #[error("Judgment oracle unavailable: {0}")]
    Unavailable(#[from] LlmError),

    /// The oracle answered, but not with an integer.
    #[error("Malformed judgment response: {0:?}")]
    Malformed(String),
}

/// Generation oracle used by the demonstration synthesizer.
#[async_trait]
pub trait DemoOracle: Send + Sync {
    /// Returns true if `source` is a runnable demonstration of the project.
    async fn validate(
        &self,
        summary: &Summary,
        candidate_path: &str,
        source: &str,
    ) -> Result<bool, LlmError>;

    /// Writes a new demonstration script. The result is raw source text.
    async fn generate(&self, summary: &Summary, readme: Option<&str>) -> Result<String, LlmError>;
}

/// Everything the judgment oracle gets to see about one execution attempt.
#[derive(Debug, Clone, Copy)]
pub struct JudgmentRequest<'a> {
    pub source: &'a str,
    pub summary: &'a Summary,
    pub outcome: &'a ExecutionOutcome,
}

/// Qualitative scoring oracle.
///
/// Implementations return whatever integer the oracle produced; range
/// enforcement belongs to the scoring engine.
#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    async fn score(&self, request: &JudgmentRequest<'_>) -> Result<i64, JudgmentError>;
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+").expect("static regex is valid"))
}

/// Extracts the first optionally-signed integer from a judgment response.
///
/// Digits beyond `i64` saturate instead of failing, so "99999999999999999999"
/// still clamps to the top of the range downstream.
pub fn parse_judgment(response: &str) -> Result<i64, JudgmentError> {
    let found = integer_pattern()
        .find(response)
        .ok_or_else(|| JudgmentError::Malformed(truncate(response, 80)))?;
    let text = found.as_str();
    Ok(text.parse::<i64>().unwrap_or(if text.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

/// Interprets a yes/no oracle answer. Anything but a leading "yes" is a no.
pub fn is_affirmative(response: &str) -> bool {
    response
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|word| !word.is_empty())
        .map(|word| word.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_judgment_plain_and_noisy() {
        assert_eq!(parse_judgment("4").unwrap(), 4);
        assert_eq!(parse_judgment(" Score: 3/5 ").unwrap(), 3);
        assert_eq!(parse_judgment("-2").unwrap(), -2);
        assert_eq!(parse_judgment("17").unwrap(), 17);
    }

    #[test]
    fn test_parse_judgment_saturates() {
        assert_eq!(parse_judgment("99999999999999999999999").unwrap(), i64::MAX);
        assert_eq!(parse_judgment("-99999999999999999999999").unwrap(), i64::MIN);
    }

    #[test]
    fn test_parse_judgment_rejects_text() {
        let err = parse_judgment("five").unwrap_err();
        assert!(matches!(err, JudgmentError::Malformed(_)));
        assert!(matches!(parse_judgment(""), Err(JudgmentError::Malformed(_))));
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("YES"));
        assert!(is_affirmative("yes."));
        assert!(is_affirmative("  Yes, it is runnable"));
        assert!(!is_affirmative("NO"));
        assert!(!is_affirmative("Yesterday"));
        assert!(!is_affirmative("The answer is yes"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_unavailable_wraps_llm_error() {
        let err: JudgmentError = LlmError::MissingApiKey.into();
        assert!(err.to_string().contains("Missing API key"));
    }
}
