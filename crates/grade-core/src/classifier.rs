//! Prefix-rule classification of courses into subject buckets.
//!
//! The rule table is plain data so it can be swapped per institution, either
//! in code or through a JSON rules file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GradeError, Result};
use crate::models::Course;

/// Label used for courses no rule claims, unless configured otherwise.
pub const DEFAULT_FALLBACK_LABEL: &str = "Other";

// ── SubjectRule ───────────────────────────────────────────────────────────────

/// Courses whose code starts with any of `prefixes` belong to `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRule {
    pub label: String,
    pub prefixes: Vec<String>,
}

impl SubjectRule {
    pub fn new(label: impl Into<String>, prefixes: &[&str]) -> Self {
        Self {
            label: label.into(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Case-sensitive prefix test against the course code.
    pub fn matches(&self, code: &str) -> bool {
        self.prefixes.iter().any(|p| code.starts_with(p.as_str()))
    }
}

// ── SubjectRules ──────────────────────────────────────────────────────────────

/// Ordered rule table. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRules {
    pub rules: Vec<SubjectRule>,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Order in which buckets are reported. Empty means rule order followed
    /// by the fallback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bucket_order: Vec<String>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_LABEL.to_string()
}

impl Default for SubjectRules {
    /// Honours, Math, Physics and Astronomy prefixes, reported in the
    /// Physics, Math, Honours, Astronomy, Other order.
    fn default() -> Self {
        Self {
            rules: vec![
                SubjectRule::new("Honours", &["HC"]),
                SubjectRule::new("Math", &["WI", "WPMA"]),
                SubjectRule::new("Physics", &["NA", "WBPH", "WPPH"]),
                SubjectRule::new("Astronomy", &["ST"]),
            ],
            fallback: default_fallback(),
            bucket_order: ["Physics", "Math", "Honours", "Astronomy", "Other"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SubjectRules {
    /// Build and validate a rule table reported in rule order.
    pub fn new(rules: Vec<SubjectRule>, fallback: impl Into<String>) -> Result<Self> {
        let table = Self {
            rules,
            fallback: fallback.into(),
            bucket_order: Vec::new(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Check labels and prefixes are non-empty and that an explicit bucket
    /// order names every label exactly once.
    pub fn validate(&self) -> Result<()> {
        if self.fallback.trim().is_empty() {
            return Err(GradeError::InvalidRule("fallback label is empty".to_string()));
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.label.trim().is_empty() {
                return Err(GradeError::InvalidRule(format!("rule {i} has an empty label")));
            }
            if rule.prefixes.is_empty() || rule.prefixes.iter().any(|p| p.is_empty()) {
                return Err(GradeError::InvalidRule(format!(
                    "rule {i} ({}) needs at least one non-empty prefix",
                    rule.label
                )));
            }
        }

        if !self.bucket_order.is_empty() {
            let expected = self.rule_labels();
            for label in &expected {
                let hits = self.bucket_order.iter().filter(|l| *l == label).count();
                if hits != 1 {
                    return Err(GradeError::InvalidRule(format!(
                        "bucket order must list \"{label}\" exactly once"
                    )));
                }
            }
            if let Some(extra) = self.bucket_order.iter().find(|l| !expected.contains(l)) {
                return Err(GradeError::InvalidRule(format!(
                    "bucket order names unknown label \"{extra}\""
                )));
            }
        }
        Ok(())
    }

    /// Distinct labels in rule order, fallback last.
    fn rule_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for rule in &self.rules {
            if !labels.contains(&rule.label) {
                labels.push(rule.label.clone());
            }
        }
        if !labels.contains(&self.fallback) {
            labels.push(self.fallback.clone());
        }
        labels
    }

    /// Labels in reporting order.
    pub fn labels(&self) -> Vec<String> {
        if self.bucket_order.is_empty() {
            self.rule_labels()
        } else {
            self.bucket_order.clone()
        }
    }

    /// Label for a single course code.
    pub fn classify(&self, code: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(code))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Partition `courses` into buckets. Every label gets a bucket, even when
    /// empty, and every course lands in exactly one bucket in input order.
    pub fn partition(&self, courses: &[Course]) -> SubjectBuckets {
        let mut buckets: Vec<SubjectBucket> = self
            .labels()
            .into_iter()
            .map(|label| SubjectBucket {
                label,
                courses: Vec::new(),
            })
            .collect();

        for course in courses {
            let label = self.classify(&course.code);
            match buckets.iter_mut().find(|b| b.label == label) {
                Some(bucket) => bucket.courses.push(course.clone()),
                // Unvalidated tables may omit a label from bucket_order.
                None => buckets.push(SubjectBucket {
                    label: label.to_string(),
                    courses: vec![course.clone()],
                }),
            }
        }

        debug!(
            "Classified {} courses into {} buckets",
            courses.len(),
            buckets.len()
        );
        SubjectBuckets { buckets }
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Default rules file: `~/.grade-report/subjects.json`.
    pub fn default_path() -> PathBuf {
        Self::default_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Rules file rooted at `base_dir` (used for testing).
    pub fn default_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".grade-report").join("subjects.json")
    }

    /// Load and validate a rules file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GradeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let rules: SubjectRules = serde_json::from_str(&content)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Atomically write the table to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

// ── SubjectBuckets ────────────────────────────────────────────────────────────

/// Courses sharing one subject label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectBucket {
    pub label: String,
    pub courses: Vec<Course>,
}

impl SubjectBucket {
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn credits(&self) -> u64 {
        self.courses.iter().map(|c| u64::from(c.ects)).sum()
    }
}

/// Ordered label → courses map produced by [`SubjectRules::partition`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectBuckets {
    buckets: Vec<SubjectBucket>,
}

impl SubjectBuckets {
    pub fn iter(&self) -> impl Iterator<Item = &SubjectBucket> {
        self.buckets.iter()
    }

    /// Buckets holding at least one course.
    pub fn non_empty(&self) -> impl Iterator<Item = &SubjectBucket> {
        self.buckets.iter().filter(|b| !b.is_empty())
    }

    pub fn get(&self, label: &str) -> Option<&SubjectBucket> {
        self.buckets.iter().find(|b| b.label == label)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Course count across all buckets.
    pub fn total_courses(&self) -> usize {
        self.buckets.iter().map(|b| b.courses.len()).sum()
    }

    /// Credit total across all buckets.
    pub fn total_credits(&self) -> u64 {
        self.buckets.iter().map(SubjectBucket::credits).sum()
    }
}
