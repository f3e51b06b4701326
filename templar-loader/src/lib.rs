//! Definition discovery for `templar-loader`.
//!
//! `load_definitions(root, formats)` walks `root` recursively and parses every
//! regular file some [`DocumentFormat`] claims. A bad file is recorded and the
//! walk keeps going, so one run reports every broken file at once.

use std::fs;
use std::path::Path;

use templar_core::{Definition, DefinitionSet, ParseFailure};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Document formats
// ---------------------------------------------------------------------------

/// A recognised definition file format: which files it claims and how to
/// turn their contents into a [`Definition`].
pub trait DocumentFormat {
    /// Whether `path` is a candidate for this format.
    fn matches(&self, path: &Path) -> bool;

    /// Parse one file's contents. The error is a human-readable cause.
    fn parse(&self, path: &Path, contents: &str) -> Result<Definition, String>;
}

/// `.yaml` / `.yml` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl DocumentFormat for YamlFormat {
    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["yaml", "yml"])
    }

    fn parse(&self, _path: &Path, contents: &str) -> Result<Definition, String> {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }
}

/// `.json` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl DocumentFormat for JsonFormat {
    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn parse(&self, _path: &Path, contents: &str) -> Result<Definition, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }
}

fn has_extension(path: &Path, accepted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| accepted.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk `root` and parse every candidate file.
///
/// Entries are visited in file-name order within each directory, so the
/// resulting set is deterministic. Zero candidates yields an empty set; any
/// unreadable or unparseable candidate yields `Err` with every failure found.
pub fn load_definitions(
    root: &Path,
    formats: &[&dyn DocumentFormat],
) -> Result<DefinitionSet, Vec<ParseFailure>> {
    let mut definitions = Vec::new();
    let mut failures = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                failures.push(ParseFailure::new(path, err.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(format) = formats.iter().find(|f| f.matches(path)) else {
            tracing::debug!("skipped: {}", path.display());
            continue;
        };

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| format.parse(path, &contents));
        match parsed {
            Ok(definition) => {
                tracing::debug!(
                    "parsed {} from {}",
                    definition.qualified_name(),
                    path.display()
                );
                definitions.push(definition);
            }
            Err(cause) => {
                tracing::debug!("failed to parse {}: {cause}", path.display());
                failures.push(ParseFailure::new(path, cause));
            }
        }
    }

    if failures.is_empty() {
        Ok(DefinitionSet::new(definitions))
    } else {
        Err(failures)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
