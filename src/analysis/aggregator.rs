//! Outcome aggregation and statistics.
//!
//! This module computes run-level summaries from per-item outcomes.

use crate::analysis::orchestrator::EMPTY_INPUT_MESSAGE;
use crate::models::{AnalysisOutcome, Likelihood, RunSummary};

/// Compute the summary for a list of outcomes.
pub fn summarize(outcomes: &[AnalysisOutcome]) -> RunSummary {
    let mut summary = RunSummary {
        total: outcomes.len(),
        ..Default::default()
    };

    let mut percentage_sum = 0.0;
    let mut top: Option<&AnalysisOutcome> = None;

    for outcome in outcomes {
        let Some(report) = outcome.report() else {
            summary.failed += 1;
            if outcome.error() == Some(EMPTY_INPUT_MESSAGE) {
                summary.empty += 1;
            }
            continue;
        };

        summary.analyzed += 1;
        if outcome.rewritten_text().is_some() {
            summary.rewritten += 1;
        }
        match report.likelihood() {
            Likelihood::Low => summary.low += 1,
            Likelihood::Moderate => summary.moderate += 1,
            Likelihood::High => summary.high += 1,
        }

        percentage_sum += report.ai_detection_percentage;
        let is_new_top = top
            .and_then(|t| t.report())
            .map_or(true, |t| report.ai_detection_percentage > t.ai_detection_percentage);
        if is_new_top {
            top = Some(outcome);
        }
    }

    if summary.analyzed > 0 {
        summary.mean_percentage = Some(percentage_sum / summary.analyzed as f64);
    }
    if let Some(top) = top {
        summary.max_percentage = top.report().map(|r| r.ai_detection_percentage);
        summary.top_item = Some(top.id.clone());
    }

    summary
}

/// Analyzed outcomes scoring at or above `threshold` percent.
pub fn at_or_above(outcomes: &[AnalysisOutcome], threshold: f64) -> Vec<&AnalysisOutcome> {
    outcomes
        .iter()
        .filter(|o| {
            o.report()
                .is_some_and(|r| r.ai_detection_percentage >= threshold)
        })
        .collect()
}

/// Count of revision suggestions across all reports.
pub fn total_suggestions(outcomes: &[AnalysisOutcome]) -> usize {
    outcomes
        .iter()
        .filter_map(|o| o.report())
        .map(|r| r.revision_suggestions.len())
        .sum()
}
