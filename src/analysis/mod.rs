//! Analysis modules.
//!
//! The orchestrator runs the per-item pipeline against the service traits;
//! the aggregator turns its outcomes into run-level statistics.

pub mod aggregator;
pub mod orchestrator;
pub mod services;

pub use aggregator::*;
pub use orchestrator::{
    Orchestrator, OrchestratorOptions, RunObserver, RunState, EMPTY_INPUT_MESSAGE,
};
pub use services::{Analyzer, Rewriter};
