//! Builds a [`Transcript`] from a parsed grades payload.

use std::path::Path;

use grade_core::data_processors::{CreditExtractor, GradeProcessor};
use grade_core::error::{GradeError, Result};
use grade_core::models::{Course, LoadDiagnostic, LoadIssue, Transcript};
use serde_json::Value;
use tracing::{debug, warn};

use crate::reader::{read_source, source_label};

/// Read `path` and build its transcript, labelled with the file stem.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let payload = read_source(path)?;
    build_transcript(source_label(path), &payload)
}

/// Build a transcript from a `{"grades": [...]}` payload.
///
/// One course per entry, taken from `course.code`, `course.nameEn` and the
/// first element of `results`. Entries without identity fields or without
/// results are left out; every problem is recorded as a diagnostic.
pub fn build_transcript(name: impl Into<String>, payload: &Value) -> Result<Transcript> {
    let name = name.into();
    let entries = payload
        .get("grades")
        .and_then(Value::as_array)
        .ok_or_else(|| GradeError::SourceFormat("payload has no \"grades\" array".to_string()))?;

    let mut courses = Vec::with_capacity(entries.len());
    let mut diagnostics = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if let Some(course) = map_to_course(index, entry, &mut diagnostics) {
            courses.push(course);
        }
    }

    let dropped = diagnostics.iter().filter(|d| d.issue.drops_entry()).count();
    if dropped > 0 {
        warn!(
            "{}: skipped {} of {} grade entries",
            name,
            dropped,
            entries.len()
        );
    }
    debug!(
        "{}: {} entries read, {} courses loaded, {} diagnostics",
        name,
        entries.len(),
        courses.len(),
        diagnostics.len()
    );

    Ok(Transcript::new(name, courses, diagnostics))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Map one payload entry to a [`Course`], returning `None` when the entry
/// lacks identity fields or results.
fn map_to_course(
    index: usize,
    entry: &Value,
    diagnostics: &mut Vec<LoadDiagnostic>,
) -> Option<Course> {
    let course = entry.get("course");
    let code = course
        .and_then(|c| c.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut report = |issue: LoadIssue| {
        diagnostics.push(LoadDiagnostic {
            index,
            code: code.clone(),
            issue,
        });
    };

    let Some(code_str) = code.clone() else {
        report(LoadIssue::MissingCourseCode);
        return None;
    };

    let Some(name) = course
        .and_then(|c| c.get("nameEn"))
        .and_then(Value::as_str)
    else {
        report(LoadIssue::MissingCourseName);
        return None;
    };

    let Some(result) = entry
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
    else {
        warn!("Grade entry {} ({}) has no results; skipping", index, code_str);
        report(LoadIssue::NoResults);
        return None;
    };

    let grade = result.get("grade").and_then(GradeProcessor::text_from_value);

    let ects = match result.get("ects").map(CreditExtractor::extract) {
        Some(Ok(ects)) => ects,
        Some(Err(raw)) => {
            report(LoadIssue::InvalidCredits(raw));
            0
        }
        None => {
            report(LoadIssue::InvalidCredits("missing".to_string()));
            0
        }
    };

    let exam_date = result
        .get("examDate")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let passed = match result.get("isPassed").and_then(Value::as_bool) {
        Some(p) => p,
        None => {
            report(LoadIssue::MissingPassedFlag);
            false
        }
    };

    Some(Course {
        code: code_str,
        name: name.to_string(),
        grade,
        ects,
        exam_date,
        passed,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
