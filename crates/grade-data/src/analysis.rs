//! Main analysis pipeline.
//!
//! Orchestrates loading, classification, series generation and aggregation,
//! returning an [`AnalysisReport`] ready for an output layer.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use grade_core::classifier::SubjectRules;
use grade_core::error::Result;
use grade_core::models::{LoadDiagnostic, SkippedCourse, Transcript};
use grade_core::series::{
    expand, expand_with_diagnostics, periodic_average, rolling_average, GradePointSeries,
    LinearTrend, PeriodAverage, DEFAULT_WINDOW_MONTHS,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::{
    Histogram, HistogramSpec, Share, SubjectHistogram, SubjectTotals, TranscriptAggregator,
};
use crate::reader::source_label;
use crate::transcript::load_transcript;

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs for a single analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Width of the periodic average window.
    pub window_months: u32,
    pub rules: SubjectRules,
    pub histogram: HistogramSpec,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            window_months: DEFAULT_WINDOW_MONTHS,
            rules: SubjectRules::default(),
            histogram: HistogramSpec::default(),
        }
    }
}

/// Cumulative average at one point of the date-sorted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub average: f64,
}

/// Everything known about one subject bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub label: String,
    pub course_codes: Vec<String>,
    pub credits: u64,
    /// Credit-weighted mean of the bucket's gradeable courses.
    pub mean_grade: Option<f64>,
    /// The bucket's grade points, sorted by date.
    pub series: GradePointSeries,
}

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    pub window_months: u32,
    /// Courses in the transcript.
    pub courses_loaded: usize,
    /// Payload entries left out of the transcript.
    pub entries_dropped: usize,
    /// Credit-unit points in the overall series.
    pub points: usize,
    /// Courses with malformed data excluded from numeric aggregates.
    pub malformed_courses: usize,
}

/// The complete output of [`analyze_transcript`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub student: String,
    pub course_count: usize,
    pub total_credits: u64,
    /// Credit-weighted mean over all gradeable courses.
    pub mean_grade: Option<f64>,
    /// All grade points, sorted by date.
    pub series: GradePointSeries,
    pub rolling_average: Vec<RollingPoint>,
    pub periodic_average: Vec<PeriodAverage>,
    pub trend: Option<LinearTrend>,
    pub histogram: Histogram,
    pub subjects: Vec<SubjectSummary>,
    pub subject_histograms: Vec<SubjectHistogram>,
    pub totals: SubjectTotals,
    pub credit_share: Vec<Share>,
    pub count_share: Vec<Share>,
    /// Courses that contributed no points, with the reason.
    pub skipped: Vec<SkippedCourse>,
    pub load_diagnostics: Vec<LoadDiagnostic>,
    pub metadata: AnalysisMetadata,
}

/// One student's line in a comparison chart.
#[derive(Debug, Clone, Serialize)]
pub struct StudentComparison {
    pub student: String,
    pub path: PathBuf,
    pub mean_grade: Option<f64>,
    pub rolling_average: Vec<RollingPoint>,
    /// Load failure for this student, if any.
    pub error: Option<String>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full analysis over an already-built transcript.
///
/// 1. Expand the courses into credit-weighted points and sort them by date.
/// 2. Compute rolling and periodic averages, mean and trend.
/// 3. Partition into subject buckets and summarise each bucket.
/// 4. Compute shares, totals and histograms.
pub fn analyze_transcript(
    transcript: &Transcript,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    // ── Step 1: Series ────────────────────────────────────────────────────────
    let (raw_series, skipped) = expand_with_diagnostics(transcript.courses());
    let series = raw_series.sorted_by_date();

    // ── Step 2: Averages ──────────────────────────────────────────────────────
    let rolling = rolling_points(&series);
    let periodic = periodic_average(&series, options.window_months)?;
    let mean_grade = series.mean();
    let trend = series.linear_trend();

    // ── Step 3: Subjects ──────────────────────────────────────────────────────
    let buckets = options.rules.partition(transcript.courses());
    let subjects: Vec<SubjectSummary> = buckets
        .iter()
        .map(|bucket| {
            let bucket_series = expand(&bucket.courses).sorted_by_date();
            SubjectSummary {
                label: bucket.label.clone(),
                course_codes: bucket.courses.iter().map(|c| c.code.clone()).collect(),
                credits: bucket.credits(),
                mean_grade: bucket_series.mean(),
                series: bucket_series,
            }
        })
        .collect();

    // ── Step 4: Aggregates ────────────────────────────────────────────────────
    let histogram = TranscriptAggregator::grade_histogram(&series, &options.histogram);
    let subject_histograms = TranscriptAggregator::subject_histograms(&buckets, &options.histogram);
    let totals = TranscriptAggregator::subject_totals(&buckets);
    let credit_share = TranscriptAggregator::credit_share(&buckets);
    let count_share = TranscriptAggregator::count_share(&buckets);

    let malformed_courses = skipped.iter().filter(|s| s.reason.is_malformed()).count();
    if malformed_courses > 0 {
        warn!(
            "{}: {} course(s) excluded from averages due to malformed data",
            transcript.name(),
            malformed_courses
        );
    }

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        window_months: options.window_months,
        courses_loaded: transcript.len(),
        entries_dropped: transcript
            .diagnostics()
            .iter()
            .filter(|d| d.issue.drops_entry())
            .count(),
        points: series.len(),
        malformed_courses,
    };

    info!(
        "{}: {} courses, {} points, mean {:?}",
        transcript.name(),
        transcript.len(),
        series.len(),
        mean_grade
    );

    Ok(AnalysisReport {
        student: transcript.name().to_string(),
        course_count: transcript.len(),
        total_credits: transcript.total_credits(),
        mean_grade,
        series,
        rolling_average: rolling,
        periodic_average: periodic,
        trend,
        histogram,
        subjects,
        subject_histograms,
        totals,
        credit_share,
        count_share,
        skipped,
        load_diagnostics: transcript.diagnostics().to_vec(),
        metadata,
    })
}

/// Load `path` and analyse it.
pub fn analyze_file(path: &Path, options: &AnalysisOptions) -> Result<AnalysisReport> {
    let transcript = load_transcript(path)?;
    analyze_transcript(&transcript, options)
}

/// Rolling averages of several students for an overlay chart.
///
/// A file that fails to load yields an entry with `error` set; the other
/// students are still compared.
pub fn compare_students(paths: &[PathBuf]) -> Vec<StudentComparison> {
    paths
        .iter()
        .map(|path| match load_transcript(path) {
            Ok(transcript) => {
                let series = expand(transcript.courses()).sorted_by_date();
                StudentComparison {
                    student: transcript.name().to_string(),
                    path: path.clone(),
                    mean_grade: series.mean(),
                    rolling_average: rolling_points(&series),
                    error: None,
                }
            }
            Err(e) => {
                warn!("Could not load {}: {}", path.display(), e);
                StudentComparison {
                    student: source_label(path),
                    path: path.clone(),
                    mean_grade: None,
                    rolling_average: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

/// Pair each date of a date-sorted series with the cumulative average.
pub fn rolling_points(sorted: &GradePointSeries) -> Vec<RollingPoint> {
    sorted
        .dates()
        .into_iter()
        .zip(rolling_average(&sorted.grades()))
        .map(|(date, average)| RollingPoint { date, average })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
