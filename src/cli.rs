//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Path argument that means "read standard input".
pub const STDIN_ARG: &str = "-";

/// GhostCheck - estimate how likely a text was written by AI, then rewrite it
///
/// Each input is analyzed by a local Ollama model. Texts that analyze
/// successfully are rewritten to read more naturally. One failing input
/// never stops the others. Markdown/JSON reports.
///
/// Examples:
///   ghostcheck essay.md
///   ghostcheck drafts/ --model qwen2.5:14b --format json -o report.json
///   ghostcheck --text "First paragraph" --text "Second paragraph"
///   cat post.txt | ghostcheck -
///   ghostcheck drafts/ --dry-run
///   ghostcheck --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Files or directories to analyze; `-` reads standard input
    ///
    /// Directories are walked for text files (see [input] in the config).
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Inline text to analyze (repeatable)
    #[arg(short, long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Ollama model to use for analysis and rewriting
    ///
    /// Can also be set via GHOSTCHECK_MODEL env var or .ghostcheck.toml config.
    #[arg(short, long, env = "GHOSTCHECK_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL", value_name = "URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds, per model call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of items analyzed at once
    ///
    /// 1 (the default) processes items strictly one after another.
    /// Results are always reported in input order.
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Skip the rewrite step
    #[arg(long)]
    pub no_rewrite: bool,

    /// Fail if any text scores at or above this AI likelihood
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is reached.
    #[arg(long, value_name = "PERCENT")]
    pub fail_above: Option<f64>,

    /// Dry run: collect inputs without calling the LLM
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .ghostcheck.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ghostcheck.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.inputs.is_empty() && self.text.is_empty() {
            return Err("Nothing to analyze: pass files, directories, '-' or --text".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(threshold) = self.fail_above {
            if !(0.0..=100.0).contains(&threshold) {
                return Err("--fail-above must be between 0 and 100".to_string());
            }
        }

        if self.inputs.iter().filter(|p| is_stdin(p)).count() > 1 {
            return Err("Standard input ('-') can only be given once".to_string());
        }

        for path in self.inputs.iter().filter(|p| !is_stdin(p)) {
            if !path.exists() {
                return Err(format!("Input does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_by_default` is `[general] verbose` from the config file;
    /// `--quiet` still wins over it.
    pub fn log_level(&self, verbose_by_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_by_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Whether a positional input means standard input.
pub fn is_stdin(path: &std::path::Path) -> bool {
    path.as_os_str() == STDIN_ARG
}
