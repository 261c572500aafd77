use chrono::NaiveDate;

/// Format a grade with two decimal places.
///
/// # Examples
///
/// ```
/// use grade_core::formatting::format_grade;
///
/// assert_eq!(format_grade(7.5), "7.50");
/// assert_eq!(format_grade(8.0 / 3.0), "2.67");
/// ```
pub fn format_grade(grade: f64) -> String {
    format!("{:.2}", grade)
}

/// Format an optional grade, rendering `None` as `"n/a"`.
///
/// # Examples
///
/// ```
/// use grade_core::formatting::format_optional_grade;
///
/// assert_eq!(format_optional_grade(Some(6.25)), "6.25");
/// assert_eq!(format_optional_grade(None), "n/a");
/// ```
pub fn format_optional_grade(grade: Option<f64>) -> String {
    grade.map(format_grade).unwrap_or_else(|| "n/a".to_string())
}

/// Format a fraction in `[0, 1]` as a percentage.
///
/// # Examples
///
/// ```
/// use grade_core::formatting::format_percent;
///
/// assert_eq!(format_percent(0.4286, 1), "42.9%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    format!("{:.prec$}%", fraction * 100.0, prec = decimals)
}

/// Format a credit count.
///
/// # Examples
///
/// ```
/// use grade_core::formatting::format_credits;
///
/// assert_eq!(format_credits(30), "30 ECTS");
/// ```
pub fn format_credits(credits: u64) -> String {
    format!("{} ECTS", credits)
}

/// Pie-slice label: subject name followed by its credit total.
///
/// # Examples
///
/// ```
/// use grade_core::formatting::slice_label;
///
/// assert_eq!(slice_label("Physics", 65), "Physics (65 ECTS)");
/// ```
pub fn slice_label(label: &str, credits: u64) -> String {
    format!("{} ({})", label, format_credits(credits))
}

/// ISO calendar date, `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a yearly trend with an explicit sign.
///
/// # Examples
///
/// ```
/// use grade_core::formatting::format_trend;
///
/// assert_eq!(format_trend(0.123), "+0.12/yr");
/// assert_eq!(format_trend(-0.5), "-0.50/yr");
/// ```
pub fn format_trend(slope_per_year: f64) -> String {
    format!("{:+.2}/yr", slope_per_year)
}

/// Histogram bin label `"lo-hi"` with one decimal.
pub fn format_bin(lower: f64, upper: f64) -> String {
    format!("{:.1}-{:.1}", lower, upper)
}
