//! Input collection: files, directories, standard input and inline text.
//!
//! Everything is turned into labeled [`TextItem`]s in the order the user
//! gave them. Directories are walked with the extension and exclude rules
//! from the `[input]` config section.

use crate::cli::is_stdin;
use crate::models::TextItem;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Label used for standard input.
pub const STDIN_LABEL: &str = "stdin";

/// Settings for directory walking.
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// File extensions to include (e.g., ["txt", "md"])
    pub extensions: Vec<String>,
    /// Path components to skip (e.g., [".git", "node_modules"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: usize,
    /// Maximum number of files taken from directories
    pub max_files: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::from(&crate::config::InputConfig::default())
    }
}

impl From<&crate::config::InputConfig> for InputConfig {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: config.max_files,
        }
    }
}

/// A text item plus the human-readable label it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedInput {
    pub label: String,
    pub item: TextItem,
}

/// Turns command-line inputs into text items.
pub struct InputCollector {
    config: InputConfig,
}

impl InputCollector {
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }

    /// Collect every input, paths first, then inline texts.
    ///
    /// Duplicate paths are only read once.
    pub fn collect(&self, paths: &[PathBuf], texts: &[String]) -> Result<Vec<CollectedInput>> {
        let mut collected = Vec::new();
        let mut seen = HashSet::new();

        for path in paths {
            if is_stdin(path) {
                collected.push(stdin_input(read_stdin()?));
            } else if path.is_dir() {
                for file in self.scan_dir(path)? {
                    self.push_file(&file, &mut seen, &mut collected)?;
                }
            } else {
                self.push_file(path, &mut seen, &mut collected)?;
            }
        }

        for (i, text) in texts.iter().enumerate() {
            collected.push(CollectedInput {
                label: format!("text #{}", i + 1),
                item: TextItem::new(text.clone()),
            });
        }

        debug!("Collected {} inputs", collected.len());
        Ok(collected)
    }

    /// List the matching files under `dir`, sorted by path.
    pub fn scan_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_extension(entry.path()) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.config.max_file_size as u64 {
                warn!(
                    "Skipping {} ({} bytes, limit {})",
                    entry.path().display(),
                    size,
                    self.config.max_file_size
                );
                continue;
            }

            if files.len() >= self.config.max_files {
                warn!(
                    "Reached the limit of {} files in {}",
                    self.config.max_files,
                    dir.display()
                );
                break;
            }

            files.push(entry.into_path());
        }

        Ok(files)
    }

    fn push_file(
        &self,
        path: &Path,
        seen: &mut HashSet<PathBuf>,
        collected: &mut Vec<CollectedInput>,
    ) -> Result<()> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !seen.insert(key) {
            debug!("Skipping duplicate input {}", path.display());
            return Ok(());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let label = path.display().to_string();

        collected.push(CollectedInput {
            item: TextItem::with_id(label.as_str(), content),
            label,
        });
        Ok(())
    }

    fn has_extension(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    /// Hidden entries and configured excludes are skipped.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.config.excludes.iter().any(|pattern| name == *pattern)
    }
}

/// Standard input gets a generated id so it can never clash with a file
/// that happens to be named `stdin`.
fn stdin_input(content: String) -> CollectedInput {
    CollectedInput {
        label: STDIN_LABEL.to_string(),
        item: TextItem::new(content),
    }
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read standard input")?;
    Ok(content)
}
