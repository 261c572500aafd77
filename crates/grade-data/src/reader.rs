//! Transcript source discovery and payload extraction.
//!
//! A source is either a plain JSON grades document or a saved grade-page
//! source in which the same document is assigned to `progressGrades` on a
//! single line.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use grade_core::error::{GradeError, Result};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Read `path` and return its grades payload.
///
/// See [`parse_source`] for the extraction rules. A file that cannot be read
/// is reported as [`GradeError::FileRead`], separately from format problems.
pub fn read_source(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| GradeError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    parse_source(&text)
}

/// Extract the grades payload from source text.
///
/// Lines are scanned in order for `progressGrades = <JSON>;` and the first
/// match is parsed and returned without looking further. When no line
/// matches, the whole text is parsed as JSON.
///
/// Only the first matching line is considered; a page that assigns
/// `progressGrades` more than once is not disambiguated.
pub fn parse_source(text: &str) -> Result<Value> {
    for (line_no, line) in text.lines().enumerate() {
        if let Some(literal) = extract_embedded_payload(line) {
            debug!("Found embedded grades payload on line {}", line_no + 1);
            return serde_json::from_str(literal.trim()).map_err(|e| {
                GradeError::SourceFormat(format!(
                    "embedded payload on line {} is not valid JSON: {}",
                    line_no + 1,
                    e
                ))
            });
        }
    }

    serde_json::from_str(text).map_err(|e| {
        GradeError::SourceFormat(format!(
            "no progressGrades assignment found and file is not valid JSON: {}",
            e
        ))
    })
}

/// The JSON literal assigned to `progressGrades` on `line`, if any.
///
/// The literal runs up to (not including) the first `;`.
pub fn extract_embedded_payload(line: &str) -> Option<&str> {
    embedded_pattern()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Find all regular, non-hidden files recursively under `dir`, sorted by
/// path.
pub fn find_transcript_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Transcript path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand directory arguments into the transcript files they contain.
/// File arguments are kept as given, in order.
pub fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = find_transcript_files(path);
            if found.is_empty() {
                warn!("No transcript files found in {}", path.display());
            }
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    out
}

/// Label used for a transcript loaded from `path`: the file stem.
pub fn source_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn embedded_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"progressGrades\s*=\s*([^;]+)").expect("regex is valid"))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
