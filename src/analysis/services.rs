//! Service seams consumed by the orchestrator.
//!
//! The orchestrator knows nothing about HTTP or prompts; it only needs
//! something that can analyze text and something that can rewrite it.

use crate::error::{AnalysisError, RewriteError};
use crate::models::AnalysisReport;
use async_trait::async_trait;
use std::sync::Arc;

/// Produces an AI-likelihood report for a block of text.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError>;
}

/// Rewrites text so it reads more naturally, guided by its report.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, text: &str, report: &AnalysisReport) -> Result<String, RewriteError>;
}

#[async_trait]
impl<T: Analyzer + ?Sized> Analyzer for Arc<T> {
    async fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError> {
        (**self).analyze(text).await
    }
}

#[async_trait]
impl<T: Rewriter + ?Sized> Rewriter for Arc<T> {
    async fn rewrite(&self, text: &str, report: &AnalysisReport) -> Result<String, RewriteError> {
        (**self).rewrite(text, report).await
    }
}
