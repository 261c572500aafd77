//! Share, total and histogram aggregation over subject buckets and grade
//! series. These feed the pie and histogram charts.

use grade_core::classifier::{SubjectBucket, SubjectBuckets};
use grade_core::error::{GradeError, Result};
use grade_core::series::{expand, GradePointSeries};
use serde::Serialize;

// ── Share ─────────────────────────────────────────────────────────────────────

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    /// Raw quantity behind the slice (credits or course count).
    pub value: f64,
    /// `value` as a fraction of the total over all slices.
    pub fraction: f64,
}

// ── SubjectTotals ─────────────────────────────────────────────────────────────

/// Course and credit count of a single non-empty bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectTotal {
    pub label: String,
    pub courses: usize,
    pub credits: u64,
}

/// Per-bucket totals plus grand totals over non-empty buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectTotals {
    pub subjects: Vec<SubjectTotal>,
    pub total_courses: usize,
    pub total_credits: u64,
}

// ── Histogram ─────────────────────────────────────────────────────────────────

/// Upper bound on the number of bins a [`HistogramSpec`] may describe.
pub const MAX_HISTOGRAM_BINS: usize = 1000;

/// Evenly spaced histogram bins from `start` to `end`.
///
/// Only constructed through [`HistogramSpec::new`] or `Default`, so every
/// value describes a whole number of bins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramSpec {
    start: f64,
    end: f64,
    step: f64,
}

impl Default for HistogramSpec {
    /// Half-grade bins from 6.0 to 10.5.
    fn default() -> Self {
        Self {
            start: 6.0,
            end: 10.5,
            step: 0.5,
        }
    }
}

impl HistogramSpec {
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self> {
        let spec = Self { start, end, step };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        let finite = self.start.is_finite() && self.end.is_finite() && self.step.is_finite();
        if !finite || self.step <= 0.0 || self.end <= self.start {
            return Err(GradeError::Config(format!(
                "invalid histogram range {}..{} step {}",
                self.start, self.end, self.step
            )));
        }

        let bins = (self.end - self.start) / self.step;
        if !bins.is_finite() || bins.round() > MAX_HISTOGRAM_BINS as f64 {
            return Err(GradeError::Config(format!(
                "histogram range {}..{} step {} needs more than {} bins",
                self.start, self.end, self.step, MAX_HISTOGRAM_BINS
            )));
        }
        if (bins - bins.round()).abs() > 1e-9 * bins.max(1.0) || bins.round() < 1.0 {
            return Err(GradeError::Config(format!(
                "histogram range {}..{} is not a whole number of {} steps",
                self.start, self.end, self.step
            )));
        }
        Ok(())
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of bins: `(end - start) / step`, which validation keeps whole.
    pub fn bin_count(&self) -> usize {
        (((self.end - self.start) / self.step).round() as usize).clamp(1, MAX_HISTOGRAM_BINS)
    }

    /// Edges of bin `index`. The last bin closes exactly at `end`.
    pub fn bin_edges(&self, index: usize) -> (f64, f64) {
        let lower = self.start + index as f64 * self.step;
        let upper = if index + 1 >= self.bin_count() {
            self.end
        } else {
            lower + self.step
        };
        (lower, upper)
    }

    /// Bin for `value`: `[lower, lower + step)`, with `end` itself counted in
    /// the last bin. `None` outside the range.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.start || value > self.end {
            return None;
        }
        let index = ((value - self.start) / self.step).floor() as usize;
        Some(index.min(self.bin_count() - 1))
    }
}

/// Counted histogram bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Histogram of grade points; one count per credit unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    /// Points that fell outside the bin range.
    pub out_of_range: usize,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Histogram for one subject bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectHistogram {
    pub label: String,
    pub histogram: Histogram,
}

// ── TranscriptAggregator ──────────────────────────────────────────────────────

/// Stateless helper computing chart inputs from buckets and series.
pub struct TranscriptAggregator;

impl TranscriptAggregator {
    /// Fraction of credits per non-empty bucket.
    ///
    /// Empty when no bucket holds a course or the credit total is zero.
    pub fn credit_share(buckets: &SubjectBuckets) -> Vec<Share> {
        Self::shares(buckets, |b| b.credits() as f64)
    }

    /// Fraction of course count per non-empty bucket.
    pub fn count_share(buckets: &SubjectBuckets) -> Vec<Share> {
        Self::shares(buckets, |b| b.courses.len() as f64)
    }

    /// Course and credit totals for every non-empty bucket.
    pub fn subject_totals(buckets: &SubjectBuckets) -> SubjectTotals {
        let subjects: Vec<SubjectTotal> = buckets
            .non_empty()
            .map(|b| SubjectTotal {
                label: b.label.clone(),
                courses: b.courses.len(),
                credits: b.credits(),
            })
            .collect();

        SubjectTotals {
            total_courses: subjects.iter().map(|s| s.courses).sum(),
            total_credits: subjects.iter().map(|s| s.credits).sum(),
            subjects,
        }
    }

    /// Count the series' points into the bins described by `spec`.
    pub fn grade_histogram(series: &GradePointSeries, spec: &HistogramSpec) -> Histogram {
        let bin_count = spec.bin_count();
        let mut bins: Vec<HistogramBin> = (0..bin_count)
            .map(|i| {
                let (lower, upper) = spec.bin_edges(i);
                HistogramBin {
                    lower,
                    upper,
                    count: 0,
                }
            })
            .collect();

        let mut out_of_range = 0;
        for point in series.points() {
            match spec.bin_index(point.grade) {
                Some(i) => bins[i].count += 1,
                None => out_of_range += 1,
            }
        }

        Histogram { bins, out_of_range }
    }

    /// One histogram per bucket, empty buckets included, in bucket order.
    pub fn subject_histograms(
        buckets: &SubjectBuckets,
        spec: &HistogramSpec,
    ) -> Vec<SubjectHistogram> {
        buckets
            .iter()
            .map(|b| SubjectHistogram {
                label: b.label.clone(),
                histogram: Self::grade_histogram(&expand(&b.courses), spec),
            })
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn shares(
        buckets: &SubjectBuckets,
        value_fn: impl Fn(&SubjectBucket) -> f64,
    ) -> Vec<Share> {
        let values: Vec<(String, f64)> = buckets
            .non_empty()
            .map(|b| (b.label.clone(), value_fn(b)))
            .collect();

        let total: f64 = values.iter().map(|(_, v)| v).sum();
        if total <= 0.0 {
            return Vec::new();
        }

        values
            .into_iter()
            .map(|(label, value)| Share {
                label,
                value,
                fraction: value / total,
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grade_core::classifier::SubjectRules;
    use grade_core::models::{Course, GradePoint};

    fn course(code: &str, grade: &str, ects: u32) -> Course {
        Course {
            code: code.to_string(),
            name: code.to_string(),
            grade: Some(grade.to_string()),
            ects,
            exam_date: "2020-01-15".to_string(),
            passed: true,
        }
    }

    fn series(grades: &[f64]) -> GradePointSeries {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        GradePointSeries::new(grades.iter().map(|&grade| GradePoint { date, grade }).collect())
    }

    fn sample_buckets() -> SubjectBuckets {
        SubjectRules::default().partition(&[
            course("NA1", "7", 5),
            course("NA2", "8", 5),
            course("WPMA1", "9", 10),
            course("HC1", "6", 0),
        ])
    }

    // ── credit_share / count_share ────────────────────────────────────────────

    #[test]
    fn test_credit_share_fractions() {
        let shares = TranscriptAggregator::credit_share(&sample_buckets());
        let labels: Vec<&str> = shares.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Physics", "Math", "Honours"]);
        assert_eq!(shares[0].fraction, 0.5);
        assert_eq!(shares[1].fraction, 0.5);
        assert_eq!(shares[2].fraction, 0.0);
    }

    #[test]
    fn test_credit_share_sums_to_one() {
        let buckets = SubjectRules::default().partition(&[
            course("NA1", "7", 3),
            course("ST1", "7", 7),
            course("XX1", "7", 11),
        ]);
        let total: f64 = TranscriptAggregator::credit_share(&buckets)
            .iter()
            .map(|s| s.fraction)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shares_empty_when_no_courses() {
        let buckets = SubjectRules::default().partition(&[]);
        assert!(TranscriptAggregator::credit_share(&buckets).is_empty());
        assert!(TranscriptAggregator::count_share(&buckets).is_empty());
    }

    #[test]
    fn test_credit_share_empty_when_no_credits() {
        let buckets = SubjectRules::default().partition(&[course("NA1", "7", 0)]);
        assert!(TranscriptAggregator::credit_share(&buckets).is_empty());
        assert_eq!(TranscriptAggregator::count_share(&buckets).len(), 1);
    }

    #[test]
    fn test_count_share_fractions() {
        let shares = TranscriptAggregator::count_share(&sample_buckets());
        assert_eq!(shares[0].label, "Physics");
        assert_eq!(shares[0].value, 2.0);
        assert_eq!(shares[0].fraction, 0.5);
        let total: f64 = shares.iter().map(|s| s.fraction).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    // ── subject_totals ────────────────────────────────────────────────────────

    #[test]
    fn test_subject_totals() {
        let totals = TranscriptAggregator::subject_totals(&sample_buckets());
        assert_eq!(totals.subjects.len(), 3);
        assert_eq!(totals.total_courses, 4);
        assert_eq!(totals.total_credits, 20);
        assert_eq!(
            totals.subjects[1],
            SubjectTotal {
                label: "Math".to_string(),
                courses: 1,
                credits: 10,
            }
        );
    }

    // ── histograms ────────────────────────────────────────────────────────────

    #[test]
    fn test_default_histogram_bins() {
        let spec = HistogramSpec::default();
        assert_eq!(spec.bin_count(), 9);
        let hist = TranscriptAggregator::grade_histogram(&series(&[]), &spec);
        assert_eq!(hist.bins.first().unwrap().lower, 6.0);
        assert_eq!(hist.bins.last().unwrap().upper, 10.5);
    }

    #[test]
    fn test_histogram_edges() {
        let spec = HistogramSpec::default();
        let hist = TranscriptAggregator::grade_histogram(
            &series(&[6.0, 6.4, 6.5, 10.0, 10.5, 5.5, 11.0]),
            &spec,
        );
        assert_eq!(hist.bins[0].count, 2);
        assert_eq!(hist.bins[1].count, 1);
        // 10.0 and 10.5 both land in the closed last bin.
        assert_eq!(hist.bins[8].count, 2);
        assert_eq!(hist.out_of_range, 2);
        assert_eq!(hist.total(), 5);
    }

    #[test]
    fn test_histogram_spec_validation() {
        assert!(HistogramSpec::new(6.0, 10.5, 0.0).is_err());
        assert!(HistogramSpec::new(10.0, 6.0, 0.5).is_err());
        assert!(HistogramSpec::new(f64::NAN, 6.0, 0.5).is_err());
        assert_eq!(HistogramSpec::new(1.0, 10.0, 1.0).unwrap().bin_count(), 9);
    }

    #[test]
    fn test_histogram_spec_rejects_unbounded_bin_count() {
        let err = HistogramSpec::new(6.0, 10.5, 1e-12).unwrap_err();
        assert!(matches!(err, GradeError::Config(_)));
        assert!(HistogramSpec::new(0.0, 1000.0, 1.0).is_ok());
        assert!(HistogramSpec::new(0.0, 1001.0, 1.0).is_err());
    }

    #[test]
    fn test_histogram_spec_requires_whole_steps() {
        let err = HistogramSpec::new(6.0, 10.4, 0.5).unwrap_err();
        assert!(matches!(err, GradeError::Config(_)));
    }

    #[test]
    fn test_histogram_last_bin_closes_at_end() {
        let spec = HistogramSpec::new(6.0, 10.4, 0.4).unwrap();
        assert_eq!(spec.bin_count(), 11);
        let hist = TranscriptAggregator::grade_histogram(&series(&[10.39, 10.4, 10.45]), &spec);
        let last = hist.bins.last().unwrap();
        assert_eq!(last.upper, 10.4);
        assert_eq!(last.count, 2);
        assert_eq!(hist.out_of_range, 1);
        assert_eq!((spec.start(), spec.end(), spec.step()), (6.0, 10.4, 0.4));
    }

    #[test]
    fn test_subject_histograms_count_credits() {
        let hists =
            TranscriptAggregator::subject_histograms(&sample_buckets(), &HistogramSpec::default());
        assert_eq!(hists.len(), 5);
        let physics = &hists[0];
        assert_eq!(physics.label, "Physics");
        assert_eq!(physics.histogram.total(), 10);
        let other = hists.iter().find(|h| h.label == "Other").unwrap();
        assert_eq!(other.histogram.total(), 0);
    }
}
