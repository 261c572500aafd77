use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data_processors::{ExamDateProcessor, GradeProcessor};

/// One examined course result taken from a transcript payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Institution course code, e.g. `"WPMA101"`.
    pub code: String,
    /// English course name.
    pub name: String,
    /// Grade exactly as it appeared in the source (`"7.5"`, `"VOL"`, ...).
    #[serde(default)]
    pub grade: Option<String>,
    /// Credit weight (ECTS).
    #[serde(default)]
    pub ects: u32,
    /// Exam date in `YYYY-MM-DD` form.
    #[serde(default)]
    pub exam_date: String,
    /// Whether the result counts as passed.
    #[serde(default)]
    pub passed: bool,
}

impl Course {
    /// The numeric grade, if one can be parsed from the raw text.
    ///
    /// Does not look at `passed`; use [`Course::grade_point`] for the full
    /// eligibility check.
    pub fn numeric_grade(&self) -> Result<f64, SkipReason> {
        match self.grade.as_deref() {
            None => Err(SkipReason::MissingGrade),
            Some(raw) => GradeProcessor::parse(raw),
        }
    }

    /// Parsed exam date.
    pub fn date(&self) -> Result<NaiveDate, SkipReason> {
        ExamDateProcessor::parse(&self.exam_date)
            .ok_or_else(|| SkipReason::InvalidExamDate(self.exam_date.clone()))
    }

    /// The `(date, grade)` this course contributes per credit unit, or the
    /// reason it contributes nothing.
    pub fn grade_point(&self) -> Result<GradePoint, SkipReason> {
        if !self.passed {
            return Err(SkipReason::NotPassed);
        }
        let grade = self.numeric_grade()?;
        let date = self.date()?;
        Ok(GradePoint { date, grade })
    }
}

/// A single credit unit's worth of grade on a given exam date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradePoint {
    pub date: NaiveDate,
    pub grade: f64,
}

/// Why a course contributed no points to a grade series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SkipReason {
    /// The course was not passed. Informational, not a data problem.
    #[error("course not passed")]
    NotPassed,
    /// No grade was recorded for a passed course.
    #[error("grade missing")]
    MissingGrade,
    /// The grade text is not a finite number.
    #[error("non-numeric grade {0:?}")]
    NonNumericGrade(String),
    /// The exam date is not a recognisable calendar date.
    #[error("invalid exam date {0:?}")]
    InvalidExamDate(String),
}

impl SkipReason {
    /// `true` for reasons that point at malformed source data.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, SkipReason::NotPassed)
    }
}

/// A course excluded from a grade series, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCourse {
    pub code: String,
    pub reason: SkipReason,
}

/// Problem found while turning a payload entry into a [`Course`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LoadIssue {
    /// `course.code` absent or not a string. Entry dropped.
    MissingCourseCode,
    /// `course.nameEn` absent or not a string. Entry dropped.
    MissingCourseName,
    /// `results` absent or empty. Entry dropped.
    NoResults,
    /// `ects` unusable; the course was loaded with zero credits.
    InvalidCredits(String),
    /// `isPassed` absent; the course was loaded as not passed.
    MissingPassedFlag,
}

impl LoadIssue {
    /// Whether the entry was left out of the transcript entirely.
    pub fn drops_entry(&self) -> bool {
        matches!(
            self,
            LoadIssue::MissingCourseCode | LoadIssue::MissingCourseName | LoadIssue::NoResults
        )
    }
}

/// A load-time diagnostic tied to the payload entry it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadDiagnostic {
    /// Position of the entry in the payload's `grades` array.
    pub index: usize,
    /// Course code, when it could be read.
    pub code: Option<String>,
    pub issue: LoadIssue,
}

/// Immutable, ordered list of courses for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    name: String,
    courses: Vec<Course>,
    diagnostics: Vec<LoadDiagnostic>,
}

impl Transcript {
    pub fn new(
        name: impl Into<String>,
        courses: Vec<Course>,
        diagnostics: Vec<LoadDiagnostic>,
    ) -> Self {
        Self {
            name: name.into(),
            courses,
            diagnostics,
        }
    }

    /// Label of the transcript, usually the source file stem.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Sum of credit weights across every course, passed or not.
    pub fn total_credits(&self) -> u64 {
        self.courses.iter().map(|c| u64::from(c.ects)).sum()
    }
}
