use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::models::SkipReason;

// ── ExamDateProcessor ─────────────────────────────────────────────────────────

/// Parses exam dates from the formats seen in grade payloads.
pub struct ExamDateProcessor;

impl ExamDateProcessor {
    /// Parse an exam date string into a calendar date.
    ///
    /// Handles plain `YYYY-MM-DD` (the normal case), RFC 3339 timestamps and
    /// naive date-time strings, keeping only the date part. Returns `None`
    /// for empty or unrecognised input.
    pub fn parse(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(date);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
        ];
        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive.date());
            }
        }

        debug!("ExamDateProcessor: could not parse exam date \"{}\"", s);
        None
    }
}

// ── GradeProcessor ────────────────────────────────────────────────────────────

/// Turns raw grade text into a numeric grade.
pub struct GradeProcessor;

impl GradeProcessor {
    /// Parse `raw` as a finite decimal grade, ignoring surrounding whitespace.
    ///
    /// Pass/fail marks such as `"VOL"` and values like `"NaN"` or `"inf"` are
    /// reported as [`SkipReason::NonNumericGrade`].
    pub fn parse(raw: &str) -> Result<f64, SkipReason> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SkipReason::MissingGrade);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SkipReason::NonNumericGrade(raw.to_string())),
        }
    }

    /// Render a JSON grade (string or number) as text. `null` and other
    /// shapes yield `None`.
    pub fn text_from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ── CreditExtractor ───────────────────────────────────────────────────────────

/// Reads credit weights from the several shapes `ects` takes in payloads.
pub struct CreditExtractor;

impl CreditExtractor {
    /// Accepts non-negative integers, integral floats (`6.0`) and numeric
    /// strings (`"6"`). Returns the offending raw text otherwise.
    pub fn extract(value: &Value) -> Result<u32, String> {
        match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    return u32::try_from(u).map_err(|_| n.to_string());
                }
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) => {
                        Ok(f as u32)
                    }
                    _ => Err(n.to_string()),
                }
            }
            Value::String(s) => s.trim().parse::<u32>().map_err(|_| s.clone()),
            other => Err(other.to_string()),
        }
    }
}
