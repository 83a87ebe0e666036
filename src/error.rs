//! Error types for the analysis services and the item collection.
//!
//! Per-item failures never escape a run; they end up as strings on the
//! item's outcome. These types exist so the services can say *why*.

use crate::models::ItemId;
use thiserror::Error;

/// Transport-level failure talking to the LLM backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("cannot connect to LLM backend at {url}. Is Ollama running?")]
    Connect { url: String },

    #[error("failed to send request: {0}")]
    Request(String),

    #[error("LLM backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse backend response: {0}")]
    InvalidResponse(String),
}

/// Failure of the analyze stage.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("malformed analysis report: {0}")]
    MalformedReport(String),

    #[error("AI detection percentage {0} is outside 0-100")]
    PercentageOutOfRange(f64),
}

/// Failure of the rewrite stage.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("model returned an empty rewrite")]
    EmptyResponse,
}

/// Rejected mutation of the text item collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemsError {
    #[error("cannot remove the last remaining text item")]
    LastItem,

    #[error("no text item with id {0}")]
    NotFound(ItemId),

    #[error("duplicate text item id {0}")]
    DuplicateId(ItemId),
}
