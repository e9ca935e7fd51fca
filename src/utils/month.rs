//! Month-string helpers. Views and summaries are keyed by `YYYY-MM`.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Parse a `YYYY-MM` month string into a half-open UTC range
/// `[first of month, first of next month)`. Returns `None` for anything
/// that is not a well-formed month.
pub fn month_range(month: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (year_str, month_str) = month.split_once('-')?;
    if year_str.len() != 4 || month_str.len() != 2 {
        return None;
    }
    if !year_str.bytes().all(|b| b.is_ascii_digit()) || !month_str.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let year: i32 = year_str.parse().ok()?;
    let month_num: u32 = month_str.parse().ok()?;
    if !(1..=12).contains(&month_num) {
        return None;
    }

    let start = Utc.with_ymd_and_hms(year, month_num, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month_num == 12 {
        (year + 1, 1)
    } else {
        (year, month_num + 1)
    };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;

    Some((start, end))
}

/// `YYYY-MM` key of the month a date falls in.
pub fn month_of(date: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
