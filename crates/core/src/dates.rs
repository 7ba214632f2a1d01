//! Date parsing for visit times and user input.
//!
//! Three levels of strictness are used:
//!
//! - [`parse_user_date`]: dates typed by a user, `YYYY-MM-DD` only
//! - [`parse_visit_date`]: the canonical Visit_time layouts (`M/D/YYYY` or `M-D-YYYY`,
//!   optionally followed by `H:MM:SS`)
//! - [`flexible_parse`]: a broad set of human-entered layouts, for recency and reporting

use crate::constants::{
    USER_DATE_FORMAT, USER_DATE_HINT, VISIT_DATETIME_FORMATS, VISIT_DATE_FORMATS,
};
use crate::{ClinicError, ClinicResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Layouts that carry a time of day.
///
/// Order matters: chrono's `%Y` reads one to four digits, so `1/2/20` would match a
/// year-first layout as the year 1. Month-first layouts with two-digit years go first;
/// year-first layouts go last, where a four-digit year can never be read as a month.
const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%m-%d-%Y %I:%M:%S %p",
    "%m-%d-%Y %I:%M %p",
    "%b %d %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts, ordered like [`FLEXIBLE_DATETIME_FORMATS`].
const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m-%d-%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
];

/// Parses a date typed by a user as `YYYY-MM-DD`.
pub fn parse_user_date(input: &str) -> ClinicResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), USER_DATE_FORMAT).map_err(|_| {
        ClinicError::InvalidDate {
            input: input.to_string(),
            expected: USER_DATE_HINT,
        }
    })
}

/// Formats a date the way Visit_time is stored: `M/D/YYYY` without zero padding.
pub fn format_visit_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Parses a Visit_time in one of the canonical layouts and returns its calendar date.
///
/// Returns `None` when no layout matches.
pub fn parse_visit_date(visit_time: &str) -> Option<NaiveDate> {
    let value = visit_time.trim();
    if value.is_empty() {
        return None;
    }

    VISIT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            VISIT_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a broad range of human-entered date and date-time layouts.
///
/// Dates without a time of day are returned at midnight.
pub fn flexible_parse(input: &str) -> Option<NaiveDateTime> {
    let value = input.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_local());
    }

    FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            FLEXIBLE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Calendar date of [`flexible_parse`].
pub fn flexible_date(input: &str) -> Option<NaiveDate> {
    flexible_parse(input).map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_user_date_accepts_iso() {
        assert_eq!(parse_user_date("2020-01-02").unwrap(), ymd(2020, 1, 2));
        assert_eq!(parse_user_date(" 2020-01-02 ").unwrap(), ymd(2020, 1, 2));
    }

    #[test]
    fn test_parse_user_date_rejects_other_layouts() {
        for input in ["1/2/2020", "2020/01/02", "2020-13-01", "", "yesterday"] {
            assert!(
                matches!(parse_user_date(input), Err(ClinicError::InvalidDate { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_format_visit_date_has_no_padding() {
        assert_eq!(format_visit_date(ymd(2020, 1, 2)), "1/2/2020");
        assert_eq!(format_visit_date(ymd(2021, 12, 25)), "12/25/2021");
    }

    #[test]
    fn test_parse_visit_date_canonical_layouts() {
        assert_eq!(parse_visit_date("1/2/2020"), Some(ymd(2020, 1, 2)));
        assert_eq!(parse_visit_date("01/02/2020"), Some(ymd(2020, 1, 2)));
        assert_eq!(parse_visit_date("1/2/2020 10:00:00"), Some(ymd(2020, 1, 2)));
        assert_eq!(parse_visit_date("1-2-2020"), Some(ymd(2020, 1, 2)));
        assert_eq!(parse_visit_date("12-31-2019 23:59:59"), Some(ymd(2019, 12, 31)));
    }

    #[test]
    fn test_parse_visit_date_rejects_other_layouts() {
        assert_eq!(parse_visit_date("2020-01-02"), None);
        assert_eq!(parse_visit_date("Jan 2 2020"), None);
        assert_eq!(parse_visit_date("13/1/2020"), None);
        assert_eq!(parse_visit_date(""), None);
    }

    #[test]
    fn test_flexible_parse_accepts_common_layouts() {
        let expected = ymd(2020, 1, 2);
        for input in [
            "2020-01-02",
            "2020-01-02T08:30:00",
            "2020-01-02 08:30",
            "2020-01-02T08:30:00Z",
            "2020/01/02",
            "1/2/2020",
            "1/2/2020 10:00:00",
            "1/2/2020 9:15 PM",
            "1-2-2020",
            "1/2/20",
            "January 2, 2020",
            "Jan 2 2020",
            "2 January 2020",
            "20200102",
        ] {
            assert_eq!(flexible_date(input), Some(expected), "failed on {input}");
        }
    }

    #[test]
    fn test_flexible_parse_keeps_time_of_day() {
        let dt = flexible_parse("1/2/2020 9:15 PM").unwrap();
        assert_eq!(dt, ymd(2020, 1, 2).and_hms_opt(21, 15, 0).unwrap());
    }

    #[test]
    fn test_flexible_parse_rejects_garbage() {
        assert_eq!(flexible_parse("not a date"), None);
        assert_eq!(flexible_parse("   "), None);
        assert_eq!(flexible_parse("2/30/2020"), None);
    }
}
