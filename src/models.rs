//! Data models for the text checker.
//!
//! This module contains the core data structures shared across the
//! application: text items, analysis reports, per-item outcomes and
//! the final run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, unique identifier of a text item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single block of text submitted for checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextItem {
    pub id: ItemId,
    pub content: String,
}

impl TextItem {
    /// Creates an item with a freshly generated id.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            content: content.into(),
        }
    }

    pub fn with_id(id: impl Into<ItemId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    /// True when the content has no non-whitespace characters.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// One passage the model flagged, with a suggested fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionSuggestion {
    /// The passage that reads as machine-written.
    pub suspicious_passage: String,
    /// How to make it read more naturally.
    pub suggestion: String,
    /// An example rewrite of the passage.
    pub rewritten_example: String,
}

/// Structured AI-likelihood report produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// One or two sentence verdict.
    pub conclusion: String,
    /// Estimated likelihood that the text is AI-generated, 0-100.
    pub ai_detection_percentage: f64,
    /// Observations supporting the verdict, most important first.
    #[serde(default)]
    pub key_evidence: Vec<String>,
    /// Concrete edits, in the order the model proposed them.
    #[serde(default)]
    pub revision_suggestions: Vec<RevisionSuggestion>,
}

impl AnalysisReport {
    pub fn likelihood(&self) -> Likelihood {
        Likelihood::from_percentage(self.ai_detection_percentage)
    }
}

/// Banded AI-likelihood, used for display and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    /// Below 40% - reads as human-written
    Low,
    /// 40% up to 75% - mixed signals
    Moderate,
    /// 75% and above - reads as machine-generated
    High,
}

impl Likelihood {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 75.0 {
            Likelihood::High
        } else if percentage >= 40.0 {
            Likelihood::Moderate
        } else {
            Likelihood::Low
        }
    }

    /// Returns an emoji representation of the band.
    pub fn emoji(&self) -> &'static str {
        match self {
            Likelihood::Low => "🟢",
            Likelihood::Moderate => "🟡",
            Likelihood::High => "🔴",
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Likelihood::Low => write!(f, "Low"),
            Likelihood::Moderate => write!(f, "Moderate"),
            Likelihood::High => write!(f, "High"),
        }
    }
}

/// What happened to one item. A report and an error can never coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum ItemResult {
    Analyzed {
        report: AnalysisReport,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rewritten_text: Option<String>,
    },
    Failed {
        error: String,
    },
}

/// Result of processing one text item, correlated to it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub id: ItemId,
    pub original_text: String,
    #[serde(flatten)]
    pub result: ItemResult,
}

impl AnalysisOutcome {
    pub fn analyzed(
        item: &TextItem,
        report: AnalysisReport,
        rewritten_text: Option<String>,
    ) -> Self {
        Self {
            id: item.id.clone(),
            original_text: item.content.clone(),
            result: ItemResult::Analyzed {
                report,
                rewritten_text,
            },
        }
    }

    pub fn failed(item: &TextItem, error: impl Into<String>) -> Self {
        Self {
            id: item.id.clone(),
            original_text: item.content.clone(),
            result: ItemResult::Failed {
                error: error.into(),
            },
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.result {
            ItemResult::Analyzed { report, .. } => Some(report),
            ItemResult::Failed { .. } => None,
        }
    }

    pub fn rewritten_text(&self) -> Option<&str> {
        match &self.result {
            ItemResult::Analyzed { rewritten_text, .. } => rewritten_text.as_deref(),
            ItemResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.result {
            ItemResult::Failed { error } => Some(error),
            ItemResult::Analyzed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, ItemResult::Analyzed { .. })
    }
}

/// Summary statistics over one run's outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of submitted items.
    pub total: usize,
    /// Items with a report.
    pub analyzed: usize,
    /// Items that ended in an error (including empty input).
    pub failed: usize,
    /// Items rejected as empty before any service call.
    pub empty: usize,
    /// Analyzed items that also received a rewrite.
    pub rewritten: usize,
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    /// Mean AI percentage across analyzed items.
    pub mean_percentage: Option<f64>,
    /// Highest AI percentage across analyzed items.
    pub max_percentage: Option<f64>,
    /// Id of the item with the highest AI percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_item: Option<ItemId>,
}

/// Metadata about a check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time of the run.
    pub analysis_date: DateTime<Utc>,
    /// Name of the LLM model used.
    pub model_used: String,
    /// Number of submitted items.
    pub items_total: usize,
    /// Number of items without a report.
    pub items_failed: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// An outcome paired with where its text came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledOutcome {
    /// Human-readable source (file path, `stdin`, `text #2`).
    pub label: String,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}

/// The complete report for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: RunSummary,
    pub items: Vec<LabeledOutcome>,
}
