//! Markdown and JSON report generation.
//!
//! This module renders the outcomes of a check run into a human-readable
//! Markdown document or a machine-readable JSON file.

use crate::config::ReportConfig;
use crate::models::{AnalysisReport, LabeledOutcome, Likelihood, Report, ReportMetadata, RunSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# GhostCheck Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary, &report.items));
    output.push_str(&generate_items_section(&report.items, options));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Texts Checked:** {}\n", metadata.items_total));
    if metadata.items_failed > 0 {
        section.push_str(&format!("- **Texts Failed:** {}\n", metadata.items_failed));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &RunSummary, items: &[LabeledOutcome]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    section.push_str("### AI Likelihood Breakdown\n\n");
    section.push_str(&format!(
        "| {} High | {} Moderate | {} Low | Failed | **Total** |\n",
        Likelihood::High.emoji(),
        Likelihood::Moderate.emoji(),
        Likelihood::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        summary.high, summary.moderate, summary.low, summary.failed, summary.total
    ));

    if let Some(mean) = summary.mean_percentage {
        section.push_str(&format!("- **Average AI likelihood:** {:.0}%\n", mean));
    }
    if let (Some(max), Some(top)) = (summary.max_percentage, summary.top_item.as_ref()) {
        let label = items
            .iter()
            .find(|i| &i.outcome.id == top)
            .map(|i| i.label.as_str())
            .unwrap_or_else(|| top.as_str());
        section.push_str(&format!("- **Highest:** {:.0}% ({})\n", max, label));
    }
    if summary.analyzed > 0 {
        section.push_str(&format!(
            "- **Rewritten:** {} of {}\n",
            summary.rewritten, summary.analyzed
        ));
    }
    if summary.empty > 0 {
        section.push_str(&format!("- **Empty inputs skipped:** {}\n", summary.empty));
    }
    section.push('\n');

    section
}

/// Generate the per-text section.
fn generate_items_section(items: &[LabeledOutcome], options: &ReportConfig) -> String {
    let mut section = String::new();

    section.push_str("## Results\n\n");

    if items.is_empty() {
        section.push_str("No texts were checked.\n\n");
        return section;
    }

    for (i, item) in items.iter().enumerate() {
        section.push_str(&generate_item_block(i + 1, item, options));
    }

    section
}

/// Generate the block for one text.
fn generate_item_block(index: usize, item: &LabeledOutcome, options: &ReportConfig) -> String {
    let mut block = String::new();
    let outcome = &item.outcome;

    block.push_str(&format!("### {}. {}\n\n", index, item.label));

    match outcome.report() {
        Some(report) => {
            block.push_str(&generate_analysis_block(report, options));

            if let Some(rewritten) = outcome.rewritten_text() {
                block.push_str("#### Rewritten Text\n\n");
                block.push_str(&quote(rewritten));
                block.push('\n');
            }
        }
        None => {
            let error = outcome.error().unwrap_or_default();
            block.push_str(&format!("> ❌ **Analysis failed:** {}\n\n", error));
        }
    }

    if options.include_original && !outcome.original_text.trim().is_empty() {
        block.push_str("<details>\n<summary>Original Text</summary>\n\n");
        block.push_str(&outcome.original_text);
        block.push_str("\n\n</details>\n\n");
    }

    block.push_str("---\n\n");

    block
}

fn generate_analysis_block(report: &AnalysisReport, options: &ReportConfig) -> String {
    let mut block = String::new();
    let likelihood = report.likelihood();

    block.push_str(&format!(
        "{} **{}% likely AI-generated** ({})\n\n",
        likelihood.emoji(),
        report.ai_detection_percentage,
        likelihood
    ));
    block.push_str(&format!("**Conclusion:** {}\n\n", report.conclusion));

    if options.include_evidence && !report.key_evidence.is_empty() {
        block.push_str("#### Key Evidence\n\n");
        for evidence in &report.key_evidence {
            block.push_str(&format!("- {}\n", evidence));
        }
        block.push('\n');
    }

    if options.include_suggestions && !report.revision_suggestions.is_empty() {
        block.push_str("#### Revision Suggestions\n\n");
        for (i, s) in report.revision_suggestions.iter().enumerate() {
            block.push_str(&format!("{}. \"{}\"\n", i + 1, s.suspicious_passage));
            block.push_str(&format!("   - 💡 {}\n", s.suggestion));
            if !s.rewritten_example.is_empty() {
                block.push_str(&format!("   - ✏️ {}\n", s.rewritten_example));
            }
        }
        block.push('\n');
    }

    block
}

/// Prefix every line with `> `.
fn quote(text: &str) -> String {
    let mut quoted = String::new();
    for line in text.lines() {
        quoted.push_str("> ");
        quoted.push_str(line);
        quoted.push('\n');
    }
    quoted
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str(
        "*Report generated by GhostCheck. Scores are model estimates, not proof of authorship.*\n",
    );

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
