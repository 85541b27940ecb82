//! Score report types.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

const JUDGMENT_MIN: i64 = 0;
const JUDGMENT_MAX: i64 = 5;

/// Closed range of the qualitative judgment score.
pub const JUDGMENT_RANGE: RangeInclusive<i64> = JUDGMENT_MIN..=JUDGMENT_MAX;

/// Number of deterministic binary checks.
pub const AUTOMATED_CHECKS: u32 = 5;

/// Best possible total: every check passes and the judgment is maximal.
pub const MAX_TOTAL_SCORE: i64 = AUTOMATED_CHECKS as i64 + JUDGMENT_MAX;

/// Per-check results. Each automated field is 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub no_syntax_error: u8,
    pub clean_exit: u8,
    pub within_time: u8,
    pub produced_output: u8,
    pub no_stderr: u8,
    /// Qualitative judgment, always inside [`JUDGMENT_RANGE`].
    pub judgment: i64,
}

impl ScoreBreakdown {
    /// Sum of the five binary checks.
    pub fn automated_subtotal(&self) -> u32 {
        [
            self.no_syntax_error,
            self.clean_exit,
            self.within_time,
            self.produced_output,
            self.no_stderr,
        ]
        .iter()
        .map(|&check| u32::from(check))
        .sum()
    }
}

/// Final, immutable score for one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub breakdown: ScoreBreakdown,
    pub automated_subtotal: u32,
    pub judgment_score: i64,
    pub total: i64,
    pub max_total: i64,
}

impl ScoreReport {
    /// Derives the subtotal and total from a breakdown.
    pub fn from_breakdown(breakdown: ScoreBreakdown) -> Self {
        let automated_subtotal = breakdown.automated_subtotal();
        Self {
            breakdown,
            automated_subtotal,
            judgment_score: breakdown.judgment,
            total: i64::from(automated_subtotal) + breakdown.judgment,
            max_total: MAX_TOTAL_SCORE,
        }
    }
}

impl std::fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} (automated {}/{}, judgment {}/{})",
            self.total,
            self.max_total,
            self.automated_subtotal,
            AUTOMATED_CHECKS,
            self.judgment_score,
            JUDGMENT_MAX
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_total() {
        assert_eq!(MAX_TOTAL_SCORE, 10);
    }

    #[test]
    fn test_report_totals() {
        let breakdown = ScoreBreakdown {
            no_syntax_error: 1,
            clean_exit: 0,
            within_time: 1,
            produced_output: 1,
            no_stderr: 0,
            judgment: 3,
        };
        let report = ScoreReport::from_breakdown(breakdown);
        assert_eq!(report.automated_subtotal, 3);
        assert_eq!(report.judgment_score, 3);
        assert_eq!(report.total, 6);
        assert_eq!(report.to_string(), "6/10 (automated 3/5, judgment 3/5)");
    }
}
