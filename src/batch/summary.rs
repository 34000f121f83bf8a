//! Run summaries and diagnostic reporting.

use super::outcome::{ItemOutcome, UNKNOWN_ERROR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Aggregate view over all outcomes of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Rounded integer percentage, 0 for an empty run.
    pub success_rate: u32,
    pub is_full_success: bool,
    pub has_errors: bool,
    /// Failure count per error label. `None` when nothing failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_types: Option<BTreeMap<String, usize>>,
}

impl RunSummary {
    pub fn from_outcomes<R>(outcomes: &[ItemOutcome<R>]) -> Self {
        let total = outcomes.len();
        let mut error_types: BTreeMap<String, usize> = BTreeMap::new();
        for error in outcomes.iter().filter_map(ItemOutcome::error) {
            *error_types.entry(error_label(error).to_string()).or_default() += 1;
        }
        let error_count = error_types.values().sum::<usize>();
        let success_count = total - error_count;

        Self {
            total,
            success_count,
            error_count,
            success_rate: success_rate(success_count, total),
            is_full_success: error_count == 0,
            has_errors: error_count > 0,
            error_types: (!error_types.is_empty()).then_some(error_types),
        }
    }

    /// Log this summary under `operation`.
    pub fn log(&self, operation: &str) {
        info!(
            operation,
            total = self.total,
            succeeded = self.success_count,
            failed = self.error_count,
            success_rate = self.success_rate,
            "{}: {}/{} succeeded ({}%)",
            operation,
            self.success_count,
            self.total,
            self.success_rate
        );
        if let Some(types) = &self.error_types {
            for (label, count) in types {
                warn!(operation, error_type = %label, count, "{}: {} x {}", operation, count, label);
            }
        }
    }
}

/// Summarize a run. Pure and total.
pub fn summarize<R>(outcomes: &[ItemOutcome<R>]) -> RunSummary {
    RunSummary::from_outcomes(outcomes)
}

/// Emit human-readable diagnostics for a summary.
pub fn report(summary: &RunSummary, operation: &str) {
    summary.log(operation);
}

/// Text before the first `:`; the fixed unknown label when there is none.
pub fn error_label(error: &str) -> &str {
    let label = error.split(':').next().unwrap_or_default();
    if label.is_empty() {
        UNKNOWN_ERROR
    } else {
        label
    }
}

// round(success / total * 100) with halves rounded up.
fn success_rate(success: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((success * 200 + total) / (total * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(v: i32) -> ItemOutcome<i32> {
        ItemOutcome::success(v)
    }

    fn err(e: &str) -> ItemOutcome<i32> {
        ItemOutcome::failure(e)
    }

    #[test]
    fn test_empty_summary() {
        let s = summarize::<i32>(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.success_rate, 0);
        assert!(s.is_full_success);
        assert!(!s.has_errors);
        assert!(s.error_types.is_none());
    }

    #[test]
    fn test_all_failed() {
        let s = summarize(&[err("NetworkError: reset"), err("Rejected: bounce")]);
        assert_eq!(s.success_count, 0);
        assert_eq!(s.success_rate, 0);
        assert!(!s.is_full_success);
        assert!(s.has_errors);
    }

    #[test]
    fn test_error_types_by_prefix() {
        let s = summarize(&[
            ok(1),
            ok(2),
            err("NetworkError: timeout"),
            ok(4),
            ok(5),
        ]);
        assert_eq!(s.success_count, 4);
        assert_eq!(s.error_count, 1);
        assert_eq!(s.success_rate, 80);
        let types = s.error_types.unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types["NetworkError"], 1);
    }

    #[test]
    fn test_label_without_colon_is_whole_message() {
        assert_eq!(error_label("connection refused"), "connection refused");
        assert_eq!(error_label(""), UNKNOWN_ERROR);
        assert_eq!(error_label(":oops"), UNKNOWN_ERROR);
        assert_eq!(error_label("RateLimited: a: b"), "RateLimited");
    }

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(success_rate(1, 3), 33);
        assert_eq!(success_rate(2, 3), 67);
        assert_eq!(success_rate(1, 8), 13); // 12.5 rounds up
        assert_eq!(success_rate(5, 5), 100);
    }

    #[test]
    fn test_error_types_omitted_from_json_when_clean() {
        let json = serde_json::to_value(summarize(&[ok(1)])).unwrap();
        assert!(json.get("error_types").is_none());
        assert_eq!(json["success_rate"], 100);
    }

    #[test]
    fn test_report_does_not_panic() {
        report(&summarize(&[ok(1), err("")]), "send campaign");
        report(&summarize::<i32>(&[]), "empty");
    }
}
