//! Prompt text for the analyze and rewrite calls.

use crate::models::AnalysisReport;

/// System prompt for the analyze call.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an experienced editor who judges whether a piece of writing was produced by an AI model.
Answer with a single JSON object and nothing else, using exactly these fields:
{
  "conclusion": string,                 // one or two sentences
  "ai_detection_percentage": number,    // 0 to 100
  "key_evidence": [string],             // the strongest signals, most important first
  "revision_suggestions": [
    {"suspicious_passage": string, "suggestion": string, "rewritten_example": string}
  ]
}
Quote suspicious passages verbatim from the text. Write every field in the same language as the text."#;

/// System prompt for the rewrite call.
pub const REWRITE_SYSTEM_PROMPT: &str = r#"You are an editor who rewrites text so it reads as if a person wrote it.
Keep the meaning, facts and language of the original. Vary sentence length, prefer concrete wording, and drop filler phrases.
Reply with the rewritten text only: no preamble, no notes, no markdown fences."#;

/// Build the user message for the analyze call.
pub fn analysis_prompt(text: &str) -> String {
    format!("Analyze the following text.\n\n=== TEXT ===\n{}\n=== END ===", text)
}

/// Build the user message for the rewrite call.
pub fn rewrite_prompt(text: &str, report: &AnalysisReport) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "An analysis rated this text {}% likely to be AI-generated.\n",
        report.ai_detection_percentage
    ));
    prompt.push_str(&format!("Verdict: {}\n", report.conclusion));

    if !report.key_evidence.is_empty() {
        prompt.push_str("\nSignals to remove:\n");
        for evidence in &report.key_evidence {
            prompt.push_str(&format!("- {}\n", evidence));
        }
    }

    if !report.revision_suggestions.is_empty() {
        prompt.push_str("\nSuggested edits:\n");
        for s in &report.revision_suggestions {
            prompt.push_str(&format!("- \"{}\": {}\n", s.suspicious_passage, s.suggestion));
        }
    }

    prompt.push_str(&format!("\nRewrite the full text.\n\n=== TEXT ===\n{}\n=== END ===", text));
    prompt
}
