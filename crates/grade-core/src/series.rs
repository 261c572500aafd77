//! Credit-weighted grade series and the averages derived from them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GradeError, Result};
use crate::models::{Course, GradePoint, SkippedCourse};
use crate::time_utils::{days_between, month_end, month_index};

/// Resample window used when none is configured.
pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

// ── GradePointSeries ──────────────────────────────────────────────────────────

/// Ordered `(date, grade)` points, one per credit unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradePointSeries {
    points: Vec<GradePoint>,
}

impl GradePointSeries {
    pub fn new(points: Vec<GradePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GradePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Grades in series order.
    pub fn grades(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.grade).collect()
    }

    /// Dates in series order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// A copy sorted by date. Points sharing a date keep their relative order.
    pub fn sorted_by_date(&self) -> GradePointSeries {
        let mut points = self.points.clone();
        points.sort_by_key(|p| p.date);
        GradePointSeries { points }
    }

    /// Mean grade over all points; `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(|p| p.grade).sum();
        Some(sum / self.points.len() as f64)
    }

    /// Least-squares straight line through the points, with x measured in
    /// days since the earliest date.
    ///
    /// Returns `None` with fewer than two distinct dates.
    pub fn linear_trend(&self) -> Option<LinearTrend> {
        let origin = self.points.iter().map(|p| p.date).min()?;
        let n = self.points.len() as f64;

        let xs: Vec<f64> = self
            .points
            .iter()
            .map(|p| days_between(origin, p.date) as f64)
            .collect();
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = self.points.iter().map(|p| p.grade).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (x, p) in xs.iter().zip(&self.points) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (p.grade - mean_y);
        }
        if sxx == 0.0 {
            return None;
        }

        let slope_per_day = sxy / sxx;
        Some(LinearTrend {
            origin,
            slope_per_day,
            intercept: mean_y - slope_per_day * mean_x,
        })
    }
}

// ── LinearTrend ───────────────────────────────────────────────────────────────

/// `grade = intercept + slope_per_day * days_since(origin)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub origin: NaiveDate,
    pub slope_per_day: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Value of the fitted line on `date`.
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        self.intercept + self.slope_per_day * days_between(self.origin, date) as f64
    }

    /// Slope expressed per 365 days.
    pub fn slope_per_year(&self) -> f64 {
        self.slope_per_day * 365.0
    }
}

// ── PeriodAverage ─────────────────────────────────────────────────────────────

/// Mean grade of one resample window, labelled by its closing month end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodAverage {
    pub period_end: NaiveDate,
    pub mean: f64,
    /// Number of credit-unit points in the window.
    pub count: usize,
}

// ── Operations ────────────────────────────────────────────────────────────────

/// Credit-weighted expansion: `ects` copies of `(exam_date, grade)` for every
/// passed course with a numeric grade, in input order.
pub fn expand(courses: &[Course]) -> GradePointSeries {
    expand_with_diagnostics(courses).0
}

/// Same as [`expand`], additionally reporting every excluded course.
pub fn expand_with_diagnostics(courses: &[Course]) -> (GradePointSeries, Vec<SkippedCourse>) {
    let mut points = Vec::new();
    let mut skipped = Vec::new();

    for course in courses {
        match course.grade_point() {
            Ok(point) => {
                points.extend(std::iter::repeat(point).take(course.ects as usize));
            }
            Err(reason) => {
                if reason.is_malformed() {
                    debug!("Excluding {} from grade series: {}", course.code, reason);
                }
                skipped.push(SkippedCourse {
                    code: course.code.clone(),
                    reason,
                });
            }
        }
    }

    (GradePointSeries { points }, skipped)
}

/// Cumulative mean: `output[i]` is the mean of `values[0..=i]`.
///
/// Callers sort by date first.
pub fn rolling_average(values: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            sum += v;
            sum / (i + 1) as f64
        })
        .collect()
}

/// Mean grade per trailing window of `window_months` months.
///
/// Window boundaries are month ends. The first window closes at the end of
/// the earliest observation's month and each later window covers the
/// following `window_months` months, i.e. `(end_{k-1}, end_k]`. Windows with
/// no observations are omitted.
pub fn periodic_average(
    series: &GradePointSeries,
    window_months: u32,
) -> Result<Vec<PeriodAverage>> {
    if window_months == 0 {
        return Err(GradeError::Config(
            "resample window must be at least one month".to_string(),
        ));
    }
    let width = i32::try_from(window_months)
        .map_err(|_| GradeError::Config(format!("resample window too large: {window_months}")))?;

    let Some(anchor) = series.points.iter().map(|p| month_index(p.date)).min() else {
        return Ok(Vec::new());
    };

    // Window number → (sum, count); BTreeMap keeps windows in date order.
    let mut windows: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for point in &series.points {
        let offset = month_index(point.date) - anchor;
        // Ceiling division; `offset` is never negative.
        let window = offset / width + i32::from(offset % width != 0);
        let slot = windows.entry(window).or_insert((0.0, 0));
        slot.0 += point.grade;
        slot.1 += 1;
    }

    windows
        .into_iter()
        .map(|(window, (sum, count))| {
            let period_end = window
                .checked_mul(width)
                .and_then(|months| anchor.checked_add(months))
                .and_then(month_end)
                .ok_or_else(|| {
                    warn!("Resample window {} ends beyond supported dates", window);
                    GradeError::Config(format!(
                        "resample window of {window_months} months ends beyond supported dates"
                    ))
                })?;
            Ok(PeriodAverage {
                period_end,
                mean: sum / count as f64,
                count,
            })
        })
        .collect()
}
