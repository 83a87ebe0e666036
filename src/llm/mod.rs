//! LLM backend for the analyzer and rewriter services.

pub mod client;
pub mod prompts;

pub use client::{ClientConfig, OllamaClient};
