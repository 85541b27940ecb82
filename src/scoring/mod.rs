//! Scoring engine.
//!
//! Turns one [`ExecutionOutcome`] into one [`ScoreReport`]: five independent
//! binary checks plus a qualitative judgment clamped into [`JUDGMENT_RANGE`].
//! Scoring never fails; an unavailable or confused judgment oracle degrades
//! the judgment to the range minimum.

mod report;

use std::sync::Arc;
use std::time::Duration;

use crate::execution::{ExecutionOutcome, ExecutionStatus};
use crate::inspector::Summary;
use crate::oracle::{JudgmentOracle, JudgmentRequest};

pub use report::{ScoreBreakdown, ScoreReport, AUTOMATED_CHECKS, JUDGMENT_RANGE, MAX_TOTAL_SCORE};

/// Applies the deterministic rubric and the qualitative judgment.
pub struct ScoringEngine {
    judge: Arc<dyn JudgmentOracle>,
    time_budget: Duration,
}

impl ScoringEngine {
    /// Creates a scoring engine. `time_budget` should match the execution deadline.
    pub fn new(judge: Arc<dyn JudgmentOracle>, time_budget: Duration) -> Self {
        Self { judge, time_budget }
    }

    /// Time budget used by the "within time" check.
    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Scores an execution attempt.
    pub async fn score(
        &self,
        source: &str,
        summary: &Summary,
        outcome: &ExecutionOutcome,
    ) -> ScoreReport {
        let mut breakdown = automated_checks(outcome, self.time_budget);
        breakdown.judgment = self.judgment(source, summary, outcome).await;

        let report = ScoreReport::from_breakdown(breakdown);
        tracing::info!(
            status = %outcome.status,
            automated = report.automated_subtotal,
            judgment = report.judgment_score,
            total = report.total,
            "Scored demonstration"
        );
        report
    }

    async fn judgment(&self, source: &str, summary: &Summary, outcome: &ExecutionOutcome) -> i64 {
        let min = *JUDGMENT_RANGE.start();
        if outcome.status == ExecutionStatus::SyntaxError {
            tracing::debug!("Skipping judgment for unparsable demonstration");
            return min;
        }

        let request = JudgmentRequest {
            source,
            summary,
            outcome,
        };
        match self.judge.score(&request).await {
            Ok(raw) => {
                let clamped = clamp_judgment(raw);
                if clamped != raw {
                    tracing::warn!(raw, clamped, "Judgment out of range, clamped");
                }
                clamped
            }
            Err(e) => {
                tracing::warn!(error = %e, "Judgment unavailable, using minimum score");
                min
            }
        }
    }
}

/// Clamps a raw oracle answer into [`JUDGMENT_RANGE`].
pub fn clamp_judgment(raw: i64) -> i64 {
    raw.clamp(*JUDGMENT_RANGE.start(), *JUDGMENT_RANGE.end())
}

/// Computes the five binary checks. `judgment` is left at the range minimum.
///
/// When no demonstration process ran (`SyntaxError`, `FileNotFound`,
/// `SetupError`) there is no exit code or stdout to speak of, so checks 2
/// and 4 are 0 regardless of the record's placeholder values.
pub fn automated_checks(outcome: &ExecutionOutcome, time_budget: Duration) -> ScoreBreakdown {
    let ran = outcome.status.process_ran();

    let no_syntax_error = outcome.status != ExecutionStatus::SyntaxError;
    let clean_exit = outcome.is_clean_exit();
    let within_time = outcome.status != ExecutionStatus::TimedOut
        && outcome.elapsed_seconds < time_budget.as_secs_f64();
    let produced_output = ran && !outcome.stdout.trim().is_empty();
    let no_stderr = outcome.stderr.trim().is_empty();

    tracing::debug!(
        no_syntax_error,
        clean_exit,
        within_time,
        produced_output,
        no_stderr,
        "Automated checks"
    );

    ScoreBreakdown {
        no_syntax_error: u8::from(no_syntax_error),
        clean_exit: u8::from(clean_exit),
        within_time: u8::from(within_time),
        produced_output: u8::from(produced_output),
        no_stderr: u8::from(no_stderr),
        judgment: *JUDGMENT_RANGE.start(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::oracle::JudgmentError;

    const BUDGET: Duration = Duration::from_secs(30);

    enum Reply {
        Score(i64),
        Unavailable,
        Malformed,
    }

    struct FixedJudge {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FixedJudge {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl JudgmentOracle for FixedJudge {
        async fn score(&self, _request: &JudgmentRequest<'_>) -> Result<i64, JudgmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Score(n) => Ok(n),
                Reply::Unavailable => Err(JudgmentError::Unavailable(LlmError::MissingApiKey)),
                Reply::Malformed => Err(JudgmentError::Malformed("great".to_string())),
            }
        }
    }

    fn engine(judge: Arc<FixedJudge>) -> ScoringEngine {
        ScoringEngine::new(judge, BUDGET)
    }

    #[tokio::test]
    async fn test_clean_run_scores_full_automated() {
        let judge = FixedJudge::new(Reply::Score(4));
        let outcome = ExecutionOutcome::completed(0, "hello\n".into(), String::new(), 0.1);

        let report = engine(judge).score("print('hello')", &Summary::default(), &outcome).await;
        assert_eq!(report.automated_subtotal, 5);
        assert_eq!(report.judgment_score, 4);
        assert_eq!(report.total, 9);
        assert_eq!(report.max_total, 10);
    }

    #[tokio::test]
    async fn test_syntax_error_forces_minimum_without_asking() {
        let judge = FixedJudge::new(Reply::Score(5));
        let outcome = ExecutionOutcome::syntax_error("SyntaxError: '(' was never closed");

        let report = engine(judge.clone()).score("print(", &Summary::default(), &outcome).await;
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.breakdown.no_syntax_error, 0);
        assert_eq!(report.breakdown.clean_exit, 0);
        assert_eq!(report.breakdown.within_time, 1);
        assert_eq!(report.breakdown.produced_output, 0);
        assert_eq!(report.breakdown.no_stderr, 0);
        assert_eq!(report.automated_subtotal, 1);
        assert_eq!(report.judgment_score, 0);
    }

    #[tokio::test]
    async fn test_timeout_fails_time_check_despite_partial_output() {
        let judge = FixedJudge::new(Reply::Score(2));
        let outcome = ExecutionOutcome::timed_out(
            "step 1\n".into(),
            "Execution timed out after 30 seconds.",
            30.01,
        );

        let report = engine(judge).score("", &Summary::default(), &outcome).await;
        assert_eq!(report.breakdown.within_time, 0);
        assert_eq!(report.breakdown.clean_exit, 0);
        assert_eq!(report.breakdown.produced_output, 1);
        assert_eq!(report.breakdown.no_stderr, 0);
        assert_eq!(report.automated_subtotal, 2);
    }

    #[tokio::test]
    async fn test_judgment_is_clamped() {
        let outcome = ExecutionOutcome::completed(0, "x".into(), String::new(), 0.1);

        let high = engine(FixedJudge::new(Reply::Score(42)))
            .score("", &Summary::default(), &outcome)
            .await;
        assert_eq!(high.judgment_score, 5);

        let low = engine(FixedJudge::new(Reply::Score(-3)))
            .score("", &Summary::default(), &outcome)
            .await;
        assert_eq!(low.judgment_score, 0);
    }

    #[tokio::test]
    async fn test_judgment_failures_degrade_to_minimum() {
        let outcome = ExecutionOutcome::completed(0, "x".into(), String::new(), 0.1);
        for reply in [Reply::Unavailable, Reply::Malformed] {
            let report = engine(FixedJudge::new(reply))
                .score("", &Summary::default(), &outcome)
                .await;
            assert_eq!(report.judgment_score, 0);
            assert_eq!(report.automated_subtotal, 5);
        }
    }

    #[tokio::test]
    async fn test_rescoring_is_idempotent() {
        let engine = engine(FixedJudge::new(Reply::Score(3)));
        let outcome = ExecutionOutcome::completed(1, String::new(), "Traceback".into(), 2.5);
        let summary = Summary::default();

        let first = engine.score("import x", &summary, &outcome).await;
        let second = engine.score("import x", &summary, &outcome).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_process_means_no_output_credit() {
        for outcome in [
            ExecutionOutcome::file_not_found(),
            ExecutionOutcome::setup_error("Subprocess setup error: not found"),
        ] {
            let checks = automated_checks(&outcome, BUDGET);
            assert_eq!(checks.clean_exit, 0);
            assert_eq!(checks.produced_output, 0);
            assert_eq!(checks.no_syntax_error, 1);
            assert!(checks.automated_subtotal() <= 5);
        }
    }

    #[test]
    fn test_slow_completion_fails_time_check() {
        let outcome = ExecutionOutcome::completed(0, "done".into(), String::new(), 30.0);
        assert_eq!(automated_checks(&outcome, BUDGET).within_time, 0);
    }

    #[test]
    fn test_silence_is_penalized() {
        let outcome = ExecutionOutcome::completed(0, "  \n".into(), String::new(), 0.2);
        let checks = automated_checks(&outcome, BUDGET);
        assert_eq!(checks.produced_output, 0);
        assert_eq!(checks.automated_subtotal(), 4);
    }
}
