use chrono::{Datelike, NaiveDate};

// ── Month arithmetic ──────────────────────────────────────────────────────────

/// Count of months since year 0 for the month containing `date`.
///
/// Consecutive months map to consecutive integers, which makes fixed-width
/// month windows simple integer division.
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Last calendar day of the month identified by `index` (see [`month_index`]).
///
/// Returns `None` only when the month is outside chrono's supported range.
pub fn month_end(index: i32) -> Option<NaiveDate> {
    let next = index.checked_add(1)?;
    let year = next.div_euclid(12);
    let month = next.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

/// Number of days from `origin` to `date` (negative when `date` is earlier).
pub fn days_between(origin: NaiveDate, date: NaiveDate) -> i64 {
    (date - origin).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_index_is_contiguous_across_years() {
        assert_eq!(month_index(d(2020, 1, 1)) - month_index(d(2019, 12, 31)), 1);
        assert_eq!(month_index(d(2020, 3, 1)), month_index(d(2020, 3, 31)));
    }

    #[test]
    fn test_month_end_handles_leap_years() {
        assert_eq!(month_end(month_index(d(2020, 2, 10))), Some(d(2020, 2, 29)));
        assert_eq!(month_end(month_index(d(2021, 2, 10))), Some(d(2021, 2, 28)));
    }

    #[test]
    fn test_month_end_december() {
        assert_eq!(month_end(month_index(d(2019, 12, 5))), Some(d(2019, 12, 31)));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(d(2020, 1, 1), d(2020, 1, 31)), 30);
        assert_eq!(days_between(d(2020, 1, 31), d(2020, 1, 1)), -30);
    }
}
