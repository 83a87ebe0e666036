//! Multi-item analysis orchestration.
//!
//! Every item goes through the same two-stage pipeline:
//!
//! 1. analyze: blank input short-circuits, otherwise the analyzer is
//!    called; a failure here becomes the item's error.
//! 2. rewrite: only attempted after a successful analysis; a failure
//!    here is logged and the item keeps its report.
//!
//! Failures never cross item boundaries and never escape a run.

use crate::analysis::services::{Analyzer, Rewriter};
use crate::error::{AnalysisError, RewriteError};
use crate::models::{AnalysisOutcome, AnalysisReport, ItemId, TextItem};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Error recorded for items with no non-whitespace content.
pub const EMPTY_INPUT_MESSAGE: &str = "empty input";

/// Options for a run.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Items processed at once. 1 means strictly sequential.
    pub concurrency: usize,
    /// Whether to attempt the rewrite stage at all.
    pub rewrite: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            rewrite: true,
        }
    }
}

/// Shared run-in-progress flag (`Idle -> Running -> Idle`).
///
/// The orchestrator does not refuse overlapping runs; callers read this
/// flag to avoid starting one.
#[derive(Debug, Clone, Default)]
pub struct RunState(Arc<AtomicBool>);

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> RunGuard<'_> {
        self.0.store(true, Ordering::SeqCst);
        RunGuard(self)
    }
}

/// Clears the flag when the run ends, however it ends.
struct RunGuard<'a>(&'a RunState);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::SeqCst);
    }
}

/// Receives progress notifications during a run.
pub trait RunObserver: Send + Sync {
    fn run_started(&self, _total: usize) {}
    fn item_started(&self, _index: usize, _item: &TextItem) {}
    fn item_finished(&self, _index: usize, _outcome: &AnalysisOutcome) {}
    fn run_finished(&self, _outcomes: &[AnalysisOutcome]) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Result of the analyze stage.
enum AnalyzeStage {
    Empty,
    Failed(AnalysisError),
    Analyzed(AnalysisReport),
}

/// Result of the rewrite stage. There is no failure variant:
/// a failed rewrite collapses into `Unavailable` when the stage is built.
enum RewriteStage {
    Rewritten(String),
    Unavailable,
    Skipped,
}

impl RewriteStage {
    fn from_result(id: &ItemId, result: Result<String, RewriteError>) -> Self {
        match result {
            Ok(text) => RewriteStage::Rewritten(text),
            Err(e) => {
                warn!("[{}] Rewrite failed, keeping analysis: {}", id, e);
                RewriteStage::Unavailable
            }
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            RewriteStage::Rewritten(text) => Some(text),
            RewriteStage::Unavailable | RewriteStage::Skipped => None,
        }
    }
}

/// Drives text items through analyze and rewrite.
pub struct Orchestrator<A, R> {
    analyzer: A,
    rewriter: R,
    options: OrchestratorOptions,
    state: RunState,
}

impl<A: Analyzer, R: Rewriter> Orchestrator<A, R> {
    #[allow(dead_code)] // The CLI always passes explicit options
    pub fn new(analyzer: A, rewriter: R) -> Self {
        Self::with_options(analyzer, rewriter, OrchestratorOptions::default())
    }

    pub fn with_options(analyzer: A, rewriter: R, options: OrchestratorOptions) -> Self {
        Self {
            analyzer,
            rewriter,
            options: OrchestratorOptions {
                concurrency: options.concurrency.max(1),
                ..options
            },
            state: RunState::new(),
        }
    }

    /// Uses an externally owned run flag instead of a private one.
    #[allow(dead_code)] // Shared flag for front ends that own the run state
    pub fn with_run_state(mut self, state: RunState) -> Self {
        self.state = state;
        self
    }

    #[allow(dead_code)] // Read through Session::is_running
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    #[allow(dead_code)] // Read back by callers that built the orchestrator
    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Process every item and return one outcome per item, in input order.
    #[allow(dead_code)] // The CLI reports progress, see run_with_observer
    pub async fn run_analysis(&self, items: &[TextItem]) -> Vec<AnalysisOutcome> {
        self.run_with_observer(items, &NoopObserver).await
    }

    /// Like [`run_analysis`](Self::run_analysis), reporting progress as it goes.
    pub async fn run_with_observer(
        &self,
        items: &[TextItem],
        observer: &dyn RunObserver,
    ) -> Vec<AnalysisOutcome> {
        let _guard = self.state.enter();
        let start = Instant::now();

        info!(
            "Starting analysis of {} item(s) (concurrency: {})",
            items.len(),
            self.options.concurrency
        );
        observer.run_started(items.len());

        let outcomes: Vec<AnalysisOutcome> = if self.options.concurrency == 1 {
            let mut outcomes = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                outcomes.push(self.process_observed(index, item, observer).await);
            }
            outcomes
        } else {
            // `buffered` yields in input order regardless of completion order.
            stream::iter(items.iter().enumerate())
                .map(|(index, item)| self.process_observed(index, item, observer))
                .buffered(self.options.concurrency)
                .collect()
                .await
        };

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            "Analysis finished: {} ok, {} failed in {:.1}s",
            outcomes.len() - failed,
            failed,
            start.elapsed().as_secs_f64()
        );
        observer.run_finished(&outcomes);

        outcomes
    }

    async fn process_observed(
        &self,
        index: usize,
        item: &TextItem,
        observer: &dyn RunObserver,
    ) -> AnalysisOutcome {
        observer.item_started(index, item);
        let outcome = self.process_item(item).await;
        observer.item_finished(index, &outcome);
        outcome
    }

    /// Run both stages for a single item.
    pub async fn process_item(&self, item: &TextItem) -> AnalysisOutcome {
        match self.analyze_stage(item).await {
            AnalyzeStage::Empty => {
                debug!("[{}] Empty input, skipping", item.id);
                AnalysisOutcome::failed(item, EMPTY_INPUT_MESSAGE)
            }
            AnalyzeStage::Failed(e) => {
                warn!("[{}] Analysis failed: {}", item.id, e);
                AnalysisOutcome::failed(item, e.to_string())
            }
            AnalyzeStage::Analyzed(report) => {
                info!(
                    "[{}] {}% AI ({})",
                    item.id,
                    report.ai_detection_percentage,
                    report.likelihood()
                );
                let rewritten = self.rewrite_stage(item, &report).await.into_text();
                AnalysisOutcome::analyzed(item, report, rewritten)
            }
        }
    }

    async fn analyze_stage(&self, item: &TextItem) -> AnalyzeStage {
        if item.is_blank() {
            return AnalyzeStage::Empty;
        }

        match self.analyzer.analyze(&item.content).await {
            Ok(report) => AnalyzeStage::Analyzed(report),
            Err(e) => AnalyzeStage::Failed(e),
        }
    }

    async fn rewrite_stage(&self, item: &TextItem, report: &AnalysisReport) -> RewriteStage {
        if !self.options.rewrite {
            return RewriteStage::Skipped;
        }

        let result = self.rewriter.rewrite(&item.content, report).await;
        RewriteStage::from_result(&item.id, result)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn items(pairs: &[(&str, &str)]) -> Vec<TextItem> {
        pairs
            .iter()
            .map(|(id, content)| TextItem::with_id(*id, *content))
            .collect()
    }

    #[tokio::test]
    async fn test_output_matches_input_order_and_length() {
        let input = items(&[("a", "one"), ("b", ""), ("c", "three"), ("d", "four")]);
        let analyzer = StubAnalyzer {
            failing: vec!["three"],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(analyzer, StubRewriter::default());

        let outcomes = orchestrator.run_analysis(&input).await;

        assert_eq!(outcomes.len(), input.len());
        for (outcome, item) in outcomes.iter().zip(&input) {
            assert_eq!(outcome.id, item.id);
            assert_eq!(outcome.original_text, item.content);
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_both_services() {
        let analyzer = StubAnalyzer::default();
        let rewriter = StubRewriter::default();
        let (alog, rlog) = (analyzer.log.clone(), rewriter.log.clone());
        let orchestrator = Orchestrator::new(analyzer, rewriter);

        let outcomes = orchestrator
            .run_analysis(&items(&[("a", ""), ("b", "   \n\t")]))
            .await;

        for outcome in &outcomes {
            assert_eq!(outcome.error(), Some(EMPTY_INPUT_MESSAGE));
            assert!(outcome.report().is_none());
            assert!(outcome.rewritten_text().is_none());
        }
        assert_eq!(outcomes[1].original_text, "   \n\t");
        assert!(alog.entries().is_empty());
        assert!(rlog.entries().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_failure_never_rewrites() {
        let analyzer = StubAnalyzer {
            failing: vec!["bad"],
            ..Default::default()
        };
        let rewriter = StubRewriter::default();
        let rlog = rewriter.log.clone();
        let orchestrator = Orchestrator::new(analyzer, rewriter);

        let outcomes = orchestrator.run_analysis(&items(&[("x", "bad")])).await;

        let error = outcomes[0].error().unwrap();
        assert!(error.contains("stub failure"), "{error}");
        assert!(outcomes[0].report().is_none());
        assert_eq!(rlog.count("rewrite:"), 0);
    }

    #[tokio::test]
    async fn test_rewrite_failure_keeps_report() {
        let report = report_with("likely AI", 88.0);
        let analyzer = StubAnalyzer {
            reports: HashMap::from([("text", report.clone())]),
            ..Default::default()
        };
        let rewriter = StubRewriter {
            failing: vec!["text"],
            ..Default::default()
        };
        let rlog = rewriter.log.clone();
        let orchestrator = Orchestrator::new(analyzer, rewriter);

        let outcomes = orchestrator.run_analysis(&items(&[("x", "text")])).await;

        assert_eq!(outcomes[0].report(), Some(&report));
        assert!(outcomes[0].rewritten_text().is_none());
        assert!(outcomes[0].error().is_none());
        assert_eq!(rlog.count("rewrite:"), 1);
    }

    #[tokio::test]
    async fn test_both_stages_succeed() {
        let orchestrator = Orchestrator::new(StubAnalyzer::default(), StubRewriter::default());

        let outcomes = orchestrator.run_analysis(&items(&[("x", "text")])).await;

        assert!(outcomes[0].report().is_some());
        assert_eq!(outcomes[0].rewritten_text(), Some("rewritten text"));
        assert!(outcomes[0].error().is_none());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_later_items() {
        let analyzer = StubAnalyzer {
            failing: vec!["first"],
            ..Default::default()
        };
        let rewriter = StubRewriter {
            failing: vec!["second"],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(analyzer, rewriter);

        let outcomes = orchestrator
            .run_analysis(&items(&[("1", "first"), ("2", "second"), ("3", "third")]))
            .await;

        assert!(outcomes[0].error().is_some());
        assert!(outcomes[1].report().is_some() && outcomes[1].rewritten_text().is_none());
        assert_eq!(outcomes[2].rewritten_text(), Some("rewritten third"));
    }

    #[tokio::test]
    async fn test_items_processed_strictly_in_sequence() {
        let analyzer = StubAnalyzer {
            delays_ms: HashMap::from([("one", 50)]),
            ..Default::default()
        };
        let log = analyzer.log.clone();
        let rewriter = StubRewriter {
            log: log.clone(),
            failing: vec!["one"],
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(analyzer, rewriter);

        orchestrator
            .run_analysis(&items(&[("1", "one"), ("2", "two"), ("3", "three")]))
            .await;

        assert_eq!(
            log.entries(),
            vec![
                "analyze:start:one",
                "analyze:end:one",
                "rewrite:one",
                "analyze:start:two",
                "analyze:end:two",
                "rewrite:two",
                "analyze:start:three",
                "analyze:end:three",
                "rewrite:three",
            ]
        );
    }

    #[tokio::test]
    async fn test_bounded_concurrency_preserves_order() {
        let analyzer = StubAnalyzer {
            delays_ms: HashMap::from([("one", 50)]),
            failing: vec!["two"],
            ..Default::default()
        };
        let log = analyzer.log.clone();
        let options = OrchestratorOptions {
            concurrency: 3,
            ..Default::default()
        };
        let orchestrator = Orchestrator::with_options(analyzer, StubRewriter::default(), options);

        let outcomes = orchestrator
            .run_analysis(&items(&[("1", "one"), ("2", "two"), ("3", "three")]))
            .await;

        let ids: Vec<_> = outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(outcomes[0].is_success());
        assert!(outcomes[1].error().is_some());
        assert!(outcomes[2].is_success());
        // The slow first item did not hold the others back.
        assert!(log.index_of("analyze:start:two") < log.index_of("analyze:end:one"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_sequential() {
        let options = OrchestratorOptions {
            concurrency: 0,
            rewrite: true,
        };
        let orchestrator =
            Orchestrator::with_options(StubAnalyzer::default(), StubRewriter::default(), options);
        assert_eq!(orchestrator.options().concurrency, 1);
    }

    #[tokio::test]
    async fn test_rewrite_disabled() {
        let rewriter = StubRewriter::default();
        let rlog = rewriter.log.clone();
        let options = OrchestratorOptions {
            rewrite: false,
            ..Default::default()
        };
        let orchestrator = Orchestrator::with_options(StubAnalyzer::default(), rewriter, options);

        let outcomes = orchestrator.run_analysis(&items(&[("x", "text")])).await;

        assert!(outcomes[0].report().is_some());
        assert!(outcomes[0].rewritten_text().is_none());
        assert!(rlog.entries().is_empty());
    }

    #[tokio::test]
    async fn test_run_state_transitions() {
        let state = RunState::new();
        let seen = CallLog::default();
        let analyzer = StubAnalyzer {
            observed_running: Some((state.clone(), seen.clone())),
            ..Default::default()
        };
        let orchestrator =
            Orchestrator::new(analyzer, StubRewriter::default()).with_run_state(state.clone());

        assert!(!orchestrator.is_running());
        orchestrator.run_analysis(&items(&[("x", "text")])).await;

        assert_eq!(seen.entries(), vec!["running=true"]);
        assert!(!state.is_running());
    }

    #[derive(Default)]
    struct RecordingObserver(Mutex<Vec<String>>);

    impl RunObserver for RecordingObserver {
        fn run_started(&self, total: usize) {
            self.0.lock().unwrap().push(format!("run:{total}"));
        }
        fn item_started(&self, index: usize, item: &TextItem) {
            self.0.lock().unwrap().push(format!("start:{index}:{}", item.id));
        }
        fn item_finished(&self, index: usize, outcome: &AnalysisOutcome) {
            self.0
                .lock()
                .unwrap()
                .push(format!("done:{index}:{}", outcome.is_success()));
        }
        fn run_finished(&self, outcomes: &[AnalysisOutcome]) {
            self.0.lock().unwrap().push(format!("end:{}", outcomes.len()));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_every_item() {
        let observer = RecordingObserver::default();
        let orchestrator = Orchestrator::new(StubAnalyzer::default(), StubRewriter::default());

        orchestrator
            .run_with_observer(&items(&[("a", ""), ("b", "text")]), &observer)
            .await;

        assert_eq!(
            *observer.0.lock().unwrap(),
            vec!["run:2", "start:0:a", "done:0:false", "start:1:b", "done:1:true", "end:2"]
        );
    }

    #[tokio::test]
    async fn test_empty_then_analyzed_scenario() {
        let expected = report_with("likely human", 10.0);
        let analyzer = StubAnalyzer {
            reports: HashMap::from([("Hello world", expected.clone())]),
            ..Default::default()
        };
        let rewriter = StubRewriter {
            outputs: HashMap::from([("Hello world", "Hello, world!")]),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(analyzer, rewriter);

        let outcomes = orchestrator
            .run_analysis(&items(&[("a", ""), ("b", "Hello world")]))
            .await;

        assert_eq!(outcomes[0].id.as_str(), "a");
        assert_eq!(outcomes[0].error(), Some("empty input"));
        assert!(outcomes[0].report().is_none());

        assert_eq!(outcomes[1].id.as_str(), "b");
        assert_eq!(outcomes[1].report(), Some(&expected));
        assert_eq!(outcomes[1].rewritten_text(), Some("Hello, world!"));
        assert!(outcomes[1].error().is_none());
    }
}
