//! Presentation-facing state: the editable items and the latest results.

use crate::analysis::{Analyzer, Orchestrator, Rewriter, RunObserver};
use crate::error::ItemsError;
use crate::items::TextItems;
use crate::models::{AnalysisOutcome, ItemId, TextItem};

/// Items being edited plus the outcomes of the last run.
pub struct Session<A, R> {
    items: TextItems,
    outcomes: Vec<AnalysisOutcome>,
    orchestrator: Orchestrator<A, R>,
}

impl<A: Analyzer, R: Rewriter> Session<A, R> {
    #[allow(dead_code)] // Starting point for interactive front ends
    pub fn new(orchestrator: Orchestrator<A, R>) -> Self {
        Self::with_items(orchestrator, TextItems::new())
    }

    pub fn with_items(orchestrator: Orchestrator<A, R>, items: TextItems) -> Self {
        Self {
            items,
            outcomes: Vec::new(),
            orchestrator,
        }
    }

    #[allow(dead_code)] // Read by interactive front ends
    pub fn items(&self) -> &TextItems {
        &self.items
    }

    /// Outcomes of the most recent run, in item order.
    #[allow(dead_code)] // Read by interactive front ends
    pub fn outcomes(&self) -> &[AnalysisOutcome] {
        &self.outcomes
    }

    #[allow(dead_code)] // Read by interactive front ends
    pub fn outcome(&self, id: &ItemId) -> Option<&AnalysisOutcome> {
        self.outcomes.iter().find(|o| &o.id == id)
    }

    /// True while a run is in flight; callers disable re-submission on it.
    #[allow(dead_code)] // The CLI runs once and never re-submits
    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }

    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn add_item(&mut self, content: impl Into<String>) -> ItemId {
        self.items.add(content)
    }

    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn edit_item(
        &mut self,
        id: &ItemId,
        content: impl Into<String>,
    ) -> Result<(), ItemsError> {
        self.items.set_content(id, content)
    }

    /// Remove an item and any outcome it had.
    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn remove_item(&mut self, id: &ItemId) -> Result<TextItem, ItemsError> {
        let removed = self.items.remove(id)?;
        self.outcomes.retain(|o| &o.id != id);
        Ok(removed)
    }

    /// Analyze every item, replacing the previous outcomes.
    pub async fn analyze(&mut self, observer: &dyn RunObserver) -> &[AnalysisOutcome] {
        self.outcomes = self
            .orchestrator
            .run_with_observer(self.items.as_slice(), observer)
            .await;
        &self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::orchestrator::test_support::{StubAnalyzer, StubRewriter};
    use crate::analysis::orchestrator::NoopObserver;

    fn session() -> Session<StubAnalyzer, StubRewriter> {
        Session::new(Orchestrator::new(StubAnalyzer::default(), StubRewriter::default()))
    }

    #[test]
    fn test_new_session_has_one_blank_item() {
        let session = session();
        assert_eq!(session.items().len(), 1);
        assert!(session.outcomes().is_empty());
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_analyze_replaces_outcomes() {
        let mut session = session();
        let first = session.items().as_slice()[0].id.clone();
        session.edit_item(&first, "one").unwrap();
        let second = session.add_item("two");

        session.analyze(&NoopObserver).await;
        assert_eq!(session.outcomes().len(), 2);

        session.remove_item(&second).unwrap();
        let outcomes = session.analyze(&NoopObserver).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].id, first);
        assert_eq!(outcomes[0].rewritten_text(), Some("rewritten one"));
    }

    #[tokio::test]
    async fn test_remove_drops_matching_outcome() {
        let mut session = session();
        let a = session.items().as_slice()[0].id.clone();
        session.edit_item(&a, "alpha").unwrap();
        let b = session.add_item("beta");
        session.analyze(&NoopObserver).await;

        session.remove_item(&a).unwrap();

        assert!(session.outcome(&a).is_none());
        assert!(session.outcome(&b).is_some());
        assert_eq!(session.outcomes().len(), 1);
    }

    #[test]
    fn test_cannot_remove_last_item() {
        let mut session = session();
        let only = session.items().as_slice()[0].id.clone();
        assert_eq!(session.remove_item(&only), Err(ItemsError::LastItem));
    }
}
