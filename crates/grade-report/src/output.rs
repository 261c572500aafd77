//! Plain-text and JSON rendering of analysis reports.

use std::fmt::Write as _;

use grade_core::formatting::{
    format_bin, format_credits, format_date, format_grade, format_optional_grade, format_percent,
    format_trend, slice_label,
};
use grade_data::analysis::{AnalysisReport, StudentComparison};
use serde_json::{json, Value};

/// Width of the longest histogram bar.
const BAR_WIDTH: usize = 40;

// ── Text views ────────────────────────────────────────────────────────────────

/// Headline numbers and per-subject totals.
pub fn summary_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Student:      {}", report.student);
    let _ = writeln!(out, "Courses:      {}", report.course_count);
    let _ = writeln!(out, "Credits:      {}", format_credits(report.total_credits));
    let _ = writeln!(out, "Mean grade:   {}", format_optional_grade(report.mean_grade));
    let trend = report
        .trend
        .map(|t| format_trend(t.slope_per_year()))
        .unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(out, "Trend:        {}", trend);
    let _ = writeln!(out, "Grade points: {}", report.metadata.points);

    if !report.skipped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Excluded from averages:");
        for skipped in &report.skipped {
            let _ = writeln!(out, "  {:<12} {}", skipped.code, skipped.reason);
        }
    }

    if !report.load_diagnostics.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Load diagnostics:");
        for diag in &report.load_diagnostics {
            let _ = writeln!(
                out,
                "  entry {:<4} {:<12} {:?}",
                diag.index,
                diag.code.as_deref().unwrap_or("-"),
                diag.issue
            );
        }
    }

    out.push('\n');
    out.push_str(&subjects_table(report));
    out
}

/// Dated points with rolling average, then the periodic averages.
pub fn series_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:>6} {:>8}", "Date", "Grade", "Rolling");
    for (point, rolling) in report.series.points().iter().zip(&report.rolling_average) {
        let _ = writeln!(
            out,
            "{:<12} {:>6} {:>8}",
            format_date(point.date),
            format_grade(point.grade),
            format_grade(rolling.average)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}-month averages",
        report.metadata.window_months
    );
    let _ = writeln!(out, "{:<12} {:>6} {:>6}", "Period end", "Mean", "Points");
    for period in &report.periodic_average {
        let _ = writeln!(
            out,
            "{:<12} {:>6} {:>6}",
            format_date(period.period_end),
            format_grade(period.mean),
            period.count
        );
    }
    out
}

/// Histogram of grades, one count per credit.
pub fn distribution_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let max = report
        .histogram
        .bins
        .iter()
        .map(|b| b.count)
        .max()
        .unwrap_or(0);

    let _ = writeln!(out, "{:<10} {:>5}", "Grade", "ECTS");
    for bin in &report.histogram.bins {
        let _ = writeln!(
            out,
            "{:<10} {:>5} {}",
            format_bin(bin.lower, bin.upper),
            bin.count,
            bar(bin.count, max)
        );
    }
    if report.histogram.out_of_range > 0 {
        let _ = writeln!(out, "{} point(s) outside range", report.histogram.out_of_range);
    }
    out
}

/// Per-subject counts, credits, means and grade distribution.
pub fn subjects_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>7} {:>8} {:>6}",
        "Subject", "Courses", "Credits", "Mean"
    );
    for subject in &report.subjects {
        let _ = writeln!(
            out,
            "{:<12} {:>7} {:>8} {:>6}",
            subject.label,
            subject.course_codes.len(),
            subject.credits,
            format_optional_grade(subject.mean_grade)
        );
    }

    if report.subject_histograms.iter().any(|h| h.histogram.total() > 0) {
        let _ = writeln!(out);
        let _ = write!(out, "{:<10}", "Grade");
        for hist in &report.subject_histograms {
            let _ = write!(out, " {:>10}", hist.label);
        }
        let _ = writeln!(out);
        for (i, bin) in report.histogram.bins.iter().enumerate() {
            let _ = write!(out, "{:<10}", format_bin(bin.lower, bin.upper));
            for hist in &report.subject_histograms {
                let count = hist.histogram.bins.get(i).map(|b| b.count).unwrap_or(0);
                let _ = write!(out, " {:>10}", count);
            }
            let _ = writeln!(out);
        }
    }
    out
}

/// Course-count and credit shares per non-empty subject.
pub fn shares_table(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:>7} {:>7} {:>7}",
        "Subject", "Courses", "Share", "Credits"
    );
    for total in &report.totals.subjects {
        let count_share = report
            .count_share
            .iter()
            .find(|s| s.label == total.label)
            .map(|s| format_percent(s.fraction, 1))
            .unwrap_or_else(|| "-".to_string());
        let credit_share = report
            .credit_share
            .iter()
            .find(|s| s.label == total.label)
            .map(|s| format_percent(s.fraction, 1))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<24} {:>7} {:>7} {:>7}",
            slice_label(&total.label, total.credits),
            total.courses,
            count_share,
            credit_share
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Total Courses: {}", report.totals.total_courses);
    let _ = writeln!(out, "Total Credits: {}", report.totals.total_credits);
    out
}

/// One row per student: mean, final rolling average and point count.
pub fn compare_table(comparisons: &[StudentComparison]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>8} {:>12}",
        "Student", "Mean", "Points", "Last exam"
    );
    for c in comparisons {
        if let Some(err) = &c.error {
            let _ = writeln!(out, "{:<16} error: {}", c.student, err);
            continue;
        }
        let last = c
            .rolling_average
            .last()
            .map(|p| format_date(p.date))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>8} {:>12}",
            c.student,
            format_optional_grade(c.mean_grade),
            c.rolling_average.len(),
            last
        );
    }
    out
}

/// Text for `view` over every report, each under a `== student ==` heading
/// and separated by a blank line.
pub fn reports_text(reports: &[AnalysisReport], view: &str) -> String {
    let mut out = String::new();
    for report in reports {
        if !out.is_empty() {
            out.push('\n');
        }
        let text = match view {
            "series" => series_table(report),
            "distribution" => distribution_table(report),
            "subjects" => subjects_table(report),
            "shares" => shares_table(report),
            _ => summary_table(report),
        };
        let _ = writeln!(out, "== {} ==", report.student);
        out.push_str(&text);
    }
    out
}

// ── JSON views ────────────────────────────────────────────────────────────────

/// One JSON array holding `view` for every report, in input order.
pub fn reports_json(reports: &[AnalysisReport], view: &str) -> serde_json::Result<Value> {
    reports
        .iter()
        .map(|report| view_json(report, view))
        .collect::<serde_json::Result<Vec<Value>>>()
        .map(Value::Array)
}

/// The subset of `report` relevant to `view`, as JSON.
pub fn view_json(report: &AnalysisReport, view: &str) -> serde_json::Result<Value> {
    Ok(match view {
        "series" => json!({
            "student": report.student,
            "series": report.series,
            "rolling_average": report.rolling_average,
            "periodic_average": report.periodic_average,
            "trend": report.trend,
        }),
        "distribution" => json!({
            "student": report.student,
            "histogram": report.histogram,
        }),
        "subjects" => json!({
            "student": report.student,
            "subjects": report.subjects,
            "subject_histograms": report.subject_histograms,
        }),
        "shares" => json!({
            "student": report.student,
            "totals": report.totals,
            "credit_share": report.credit_share,
            "count_share": report.count_share,
        }),
        _ => serde_json::to_value(report)?,
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    "#".repeat((count * BAR_WIDTH).div_ceil(max))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use grade_core::models::{Course, Transcript};
    use grade_data::analysis::{analyze_transcript, AnalysisOptions};
    use std::path::PathBuf;

    fn report() -> AnalysisReport {
        let courses = vec![
            Course {
                code: "WPMA101".to_string(),
                name: "Calculus".to_string(),
                grade: Some("8.0".to_string()),
                ects: 5,
                exam_date: "2020-01-20".to_string(),
                passed: true,
            },
            Course {
                code: "NA1".to_string(),
                name: "Mechanics".to_string(),
                grade: Some("NVD".to_string()),
                ects: 5,
                exam_date: "2020-02-20".to_string(),
                passed: true,
            },
        ];
        analyze_transcript(
            &Transcript::new("alice", courses, Vec::new()),
            &AnalysisOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_summary_table_contents() {
        let text = summary_table(&report());
        assert!(text.contains("Student:      alice"));
        assert!(text.contains("Mean grade:   8.00"));
        assert!(text.contains("Credits:      10 ECTS"));
        assert!(text.contains("non-numeric grade \"NVD\""));
        assert!(text.contains("Physics"));
    }

    #[test]
    fn test_series_table_rows() {
        let text = series_table(&report());
        assert_eq!(text.matches("2020-01-20").count(), 5);
        assert!(text.contains("3-month averages"));
        assert!(text.contains("2020-01-31"));
    }

    #[test]
    fn test_distribution_table_bar() {
        let text = distribution_table(&report());
        let line = text.lines().find(|l| l.starts_with("8.0-8.5")).unwrap();
        assert!(line.contains(&"#".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_shares_table_totals() {
        let text = shares_table(&report());
        assert!(text.contains("Math (5 ECTS)"));
        assert!(text.contains("50.0%"));
        assert!(text.contains("Total Courses: 2"));
        assert!(text.contains("Total Credits: 10"));
    }

    #[test]
    fn test_compare_table_reports_errors() {
        let comparisons = vec![StudentComparison {
            student: "R".to_string(),
            path: PathBuf::from("R.json"),
            mean_grade: None,
            rolling_average: Vec::new(),
            error: Some("boom".to_string()),
        }];
        assert!(compare_table(&comparisons).contains("R                error: boom"));
    }

    #[test]
    fn test_view_json_series_shape() {
        let value = view_json(&report(), "series").unwrap();
        assert_eq!(value["student"], "alice");
        assert_eq!(value["rolling_average"].as_array().unwrap().len(), 5);
        assert_eq!(value["periodic_average"][0]["period_end"], "2020-01-31");
    }

    #[test]
    fn test_view_json_summary_is_full_report() {
        let value = view_json(&report(), "summary").unwrap();
        assert!(value.get("metadata").is_some());
        assert_eq!(value["skipped"][0]["reason"]["kind"], "non_numeric_grade");
    }

    #[test]
    fn test_reports_json_is_single_array() {
        let mut second = report();
        second.student = "bob".to_string();
        let value = reports_json(&[report(), second], "shares").unwrap();

        let text = serde_json::to_string_pretty(&value).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["student"], "alice");
        assert_eq!(items[1]["student"], "bob");
    }

    #[test]
    fn test_reports_text_separates_without_leading_blank() {
        let mut second = report();
        second.student = "bob".to_string();
        let text = reports_text(&[report(), second], "summary");

        assert!(text.starts_with("== alice =="));
        assert!(text.contains("\n\n== bob ==\n"));
        assert_eq!(reports_text(&[report()], "shares").lines().next(), Some("== alice =="));
        assert!(reports_text(&[], "summary").is_empty());
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0, 0), "");
        assert_eq!(bar(1, 2).len(), BAR_WIDTH / 2);
    }
}
