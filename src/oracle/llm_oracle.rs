//! Oracle implementation backed by an OpenAI-compatible chat model.

use std::sync::Arc;

use async_trait::async_trait;

use super::prompts::{
    render, GENERATION_PROMPT, GENERATION_SYSTEM_PROMPT, JUDGMENT_PROMPT, JUDGMENT_SYSTEM_PROMPT,
    VALIDATION_PROMPT, VALIDATION_SYSTEM_PROMPT,
};
use super::{is_affirmative, parse_judgment, DemoOracle, JudgmentError, JudgmentOracle, JudgmentRequest};
use crate::config::ForgeConfig;
use crate::error::LlmError;
use crate::inspector::Summary;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::scoring::JUDGMENT_RANGE;

/// Longest stream excerpt placed in a judgment prompt.
const MAX_STREAM_CHARS: usize = 4000;
/// Longest source excerpt placed in any prompt.
const MAX_SOURCE_CHARS: usize = 20_000;

/// LLM-backed [`DemoOracle`] and [`JudgmentOracle`].
pub struct LlmOracle {
    llm: Arc<dyn LlmProvider>,
    judge_model: String,
    generator_model: String,
    demo_file_name: String,
    timeout_secs: u64,
}

impl LlmOracle {
    /// Creates an oracle using the given provider and the models named in `config`.
    pub fn new(llm: Arc<dyn LlmProvider>, config: &ForgeConfig) -> Self {
        Self {
            llm,
            judge_model: config.judge_model.clone(),
            generator_model: config.generator_model.clone(),
            demo_file_name: config.demo_file_name.clone(),
            timeout_secs: config.execution_timeout.as_secs(),
        }
    }

    async fn ask(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let response = self.llm.generate(request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("response contained no choices".to_string()))
    }
}

#[async_trait]
impl DemoOracle for LlmOracle {
    async fn validate(
        &self,
        summary: &Summary,
        candidate_path: &str,
        source: &str,
    ) -> Result<bool, LlmError> {
        let prompt = render(
            VALIDATION_PROMPT,
            &[
                ("summary", summary.to_prompt_json().as_str()),
                ("path", candidate_path),
                ("source", excerpt(source, MAX_SOURCE_CHARS).as_str()),
            ],
        );
        let request = GenerationRequest::new(
            self.generator_model.clone(),
            vec![Message::system(VALIDATION_SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_temperature(0.0)
        .with_max_tokens(5);

        let answer = self.ask(request).await?;
        let accepted = is_affirmative(&answer);
        tracing::debug!(candidate = %candidate_path, answer = %answer.trim(), accepted, "Validation answer");
        Ok(accepted)
    }

    async fn generate(&self, summary: &Summary, readme: Option<&str>) -> Result<String, LlmError> {
        let timeout_secs = self.timeout_secs.to_string();
        let prompt = render(
            GENERATION_PROMPT,
            &[
                ("summary", summary.to_prompt_json().as_str()),
                ("readme", readme.unwrap_or("(no README found)")),
                ("file_name", self.demo_file_name.as_str()),
                ("timeout_secs", timeout_secs.as_str()),
            ],
        );
        let request = GenerationRequest::new(
            self.generator_model.clone(),
            vec![Message::system(GENERATION_SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_temperature(0.2)
        .with_max_tokens(2048);

        let raw = self.ask(request).await?;
        Ok(strip_code_fences(&raw))
    }
}

#[async_trait]
impl JudgmentOracle for LlmOracle {
    async fn score(&self, request: &JudgmentRequest<'_>) -> Result<i64, JudgmentError> {
        let min = JUDGMENT_RANGE.start().to_string();
        let max = JUDGMENT_RANGE.end().to_string();
        let outcome = request.outcome;

        let system = render(JUDGMENT_SYSTEM_PROMPT, &[("min", min.as_str()), ("max", max.as_str())]);
        let prompt = render(
            JUDGMENT_PROMPT,
            &[
                ("summary", request.summary.to_prompt_json().as_str()),
                ("source", excerpt(request.source, MAX_SOURCE_CHARS).as_str()),
                ("status", outcome.status.to_string().as_str()),
                ("exit_code", outcome.exit_code.to_string().as_str()),
                ("elapsed", format!("{:.2}", outcome.elapsed_seconds).as_str()),
                ("stdout", excerpt(&outcome.stdout, MAX_STREAM_CHARS).as_str()),
                ("stderr", excerpt(&outcome.stderr, MAX_STREAM_CHARS).as_str()),
                ("min", min.as_str()),
                ("max", max.as_str()),
            ],
        );
        let llm_request = GenerationRequest::new(
            self.judge_model.clone(),
            vec![Message::system(system), Message::user(prompt)],
        )
        .with_temperature(0.1)
        .with_max_tokens(10);

        let answer = self.ask(llm_request).await?;
        parse_judgment(&answer)
    }
}

/// Removes a surrounding markdown code fence (```python ... ```) if present.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines.last().map(|l| l.trim() == "```").unwrap_or(false) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("\n... [truncated]");
    cut
}
