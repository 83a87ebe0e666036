//! GhostCheck - AI-likelihood checker and rewriter for text
//!
//! A CLI tool that sends each input text to a local Ollama model for an
//! AI-likelihood analysis, rewrites the texts that analyzed successfully,
//! and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (no text above threshold, or no --fail-above set)
//!   1 - Runtime error (bad arguments, config, unreadable input, etc.)
//!   2 - A text scored at or above the --fail-above threshold

mod analysis;
mod cli;
mod config;
mod error;
mod input;
mod items;
mod llm;
mod models;
mod report;
mod session;

use analysis::{Orchestrator, OrchestratorOptions, RunObserver};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use input::{InputCollector, InputConfig};
use items::TextItems;
use llm::{ClientConfig, OllamaClient};
use models::{AnalysisOutcome, LabeledOutcome, Report, ReportMetadata, TextItem};
use session::Session;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config comes first: `[general] verbose` decides the log level.
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config)?;

    info!("GhostCheck v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    match run_check(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Check failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ghostcheck.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, input filters and report sections.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG`, when set, replaces the level chosen by `-v`/`-q` and the
/// config file.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let result = if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = builder.with_env_filter(EnvFilter::from_default_env()).finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = builder
            .with_max_level(args.log_level(config.general.verbose))
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.context("Failed to set tracing subscriber")
}

/// Run the complete check workflow. Returns exit code (0 or 2).
async fn run_check(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Collect the texts
    let collector = InputCollector::new(InputConfig::from(&config.input));

    if args.dry_run {
        return handle_dry_run(&collector, &args.inputs, &args.text);
    }

    let collected = collector.collect(&args.inputs, &args.text)?;
    if collected.is_empty() {
        bail!("No texts found to analyze");
    }
    println!("📥 Collected {} text(s)", collected.len());

    let mut labels: HashMap<_, _> = collected
        .iter()
        .map(|c| (c.item.id.clone(), c.label.clone()))
        .collect();
    let items: Vec<TextItem> = collected.into_iter().map(|c| c.item).collect();

    // Step 2: Set up the model client
    println!("🤖 Connecting to model...");
    println!("   Model: {}", config.model.name);
    println!("   Ollama: {}", config.model.ollama_url);
    println!("   Timeout: {}s", config.model.timeout_seconds);
    if !config.general.rewrite {
        println!("   Rewrite: disabled");
    }

    let client = OllamaClient::new(ClientConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        timeout_seconds: config.model.timeout_seconds,
    })?;
    let orchestrator = Orchestrator::with_options(
        client.clone(),
        client,
        OrchestratorOptions {
            concurrency: config.general.concurrency,
            rewrite: config.general.rewrite,
        },
    );

    // Step 3: Analyze and rewrite
    println!("\n🔬 Analyzing...\n");
    let mut session = Session::with_items(orchestrator, TextItems::from_items(items)?);
    let progress = ProgressObserver::new(args.quiet);
    let outcomes = session.analyze(&progress).await.to_vec();

    // Step 4: Build the report
    println!("\n📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();
    let summary = analysis::summarize(&outcomes);
    let suggestions = analysis::total_suggestions(&outcomes);
    let failing = args
        .fail_above
        .map(|threshold| analysis::at_or_above(&outcomes, threshold).len())
        .unwrap_or(0);

    let report = Report {
        metadata: ReportMetadata {
            analysis_date: Utc::now(),
            model_used: config.model.name.clone(),
            items_total: summary.total,
            items_failed: summary.failed,
            duration_seconds: duration,
        },
        summary: summary.clone(),
        items: outcomes
            .into_iter()
            .map(|outcome| LabeledOutcome {
                label: labels
                    .remove(&outcome.id)
                    .unwrap_or_else(|| outcome.id.to_string()),
                outcome,
            })
            .collect(),
    };

    // Step 5: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };
    let output_path = PathBuf::from(&config.general.output);
    report::write_report(&output, &output_path)?;

    println!("\n📊 Check Summary:");
    println!(
        "   Texts: {} | Analyzed: {} | Failed: {}",
        summary.total, summary.analyzed, summary.failed
    );
    println!(
        "   - 🔴 High: {} | 🟡 Moderate: {} | 🟢 Low: {}",
        summary.high, summary.moderate, summary.low
    );
    if let Some(mean) = summary.mean_percentage {
        println!("   Average AI likelihood: {:.0}%", mean);
    }
    println!(
        "   Rewritten: {} | Suggested edits: {}",
        summary.rewritten, suggestions
    );
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Check complete! Report saved to: {}",
        output_path.display()
    );

    if let Some(threshold) = args.fail_above {
        if failing > 0 {
            eprintln!(
                "\n⛔ {} text(s) scored at or above {}%. Failing (exit code 2).",
                failing, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --dry-run: list what would be analyzed, exit.
fn handle_dry_run(collector: &InputCollector, paths: &[PathBuf], texts: &[String]) -> Result<i32> {
    println!("\n🔍 Dry run: collecting inputs (no LLM call)...\n");

    let mut count = 0;
    for path in paths {
        if cli::is_stdin(path) {
            println!("     📄 stdin");
            count += 1;
        } else if path.is_dir() {
            for file in collector.scan_dir(path)? {
                let size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
                println!("     📄 {} ({} bytes)", file.display(), size);
                count += 1;
            }
        } else {
            println!("     📄 {}", path.display());
            count += 1;
        }
    }
    for (i, text) in texts.iter().enumerate() {
        println!("     📝 text #{} ({} chars)", i + 1, text.chars().count());
        count += 1;
    }

    if count == 0 {
        println!("   No matching text files found.");
    } else {
        println!("\n   Total: {} text(s)", count);
    }

    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

/// Where the active configuration came from.
///
/// Config is loaded before logging exists, so this is logged afterwards.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::File(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(e))),
    }
}

/// Progress bar over the items of a run.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl RunObserver for ProgressObserver {
    fn run_started(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn item_started(&self, index: usize, _item: &TextItem) {
        self.bar.set_message(format!("text {}", index + 1));
    }

    fn item_finished(&self, _index: usize, outcome: &AnalysisOutcome) {
        if let Some(error) = outcome.error() {
            self.bar.println(format!("   ⚠️  {}: {}", outcome.id, error));
        }
        self.bar.inc(1);
    }

    fn run_finished(&self, _outcomes: &[AnalysisOutcome]) {
        self.bar.finish_and_clear();
    }
}
