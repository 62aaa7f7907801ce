//! Null-tolerant type coercion for raw cell values
//!
//! Every helper accepts an optional raw string and never fails the row:
//! numeric coercions fall back to `None`, the date/datetime parsers fall
//! back to the current moment. The "now" fallback mirrors the platform's
//! historical behavior of keeping rows processable at the cost of
//! fabricating a plausible timestamp; see DESIGN.md before relying on it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%Y%m%d",
];

/// Convert to float; `None` for missing, empty, unparsable, or NaN input.
pub fn safe_float(value: Option<&str>) -> Option<f64> {
    let parsed: f64 = value?.trim().parse().ok()?;
    if parsed.is_nan() {
        None
    } else {
        Some(parsed)
    }
}

/// Convert to integer; `None` for missing or unparsable input.
///
/// Values with a fractional part are truncated toward zero via Rust's
/// saturating float-to-int cast ("3.9" becomes 3, "-3.9" becomes -3).
pub fn safe_int(value: Option<&str>) -> Option<i64> {
    let trimmed = value?.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    let parsed: f64 = trimmed.parse().ok()?;
    if parsed.is_nan() {
        None
    } else {
        Some(parsed as i64)
    }
}

/// Flexible date parsing; falls back to today (UTC) when the input is
/// missing or unparsable.
pub fn parse_date(value: Option<&str>) -> NaiveDate {
    try_parse_date(value).unwrap_or_else(|| Utc::now().date_naive())
}

/// Flexible datetime parsing; falls back to now (UTC) when the input is
/// missing or unparsable.
pub fn parse_datetime(value: Option<&str>) -> DateTime<Utc> {
    try_parse_datetime(value).unwrap_or_else(Utc::now)
}

fn try_parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    // A full timestamp still carries a usable date component.
    try_parse_datetime(Some(raw)).map(|dt| dt.date_naive())
}

fn try_parse_datetime(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&date.and_time(midnight)));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_float() {
        assert_eq!(safe_float(Some("27.4")), Some(27.4));
        assert_eq!(safe_float(Some(" -4.63 ")), Some(-4.63));
        assert_eq!(safe_float(Some("warm")), None);
        assert_eq!(safe_float(Some("NaN")), None);
        assert_eq!(safe_float(None), None);
    }

    #[test]
    fn test_safe_int() {
        assert_eq!(safe_int(Some("48213")), Some(48213));
        assert_eq!(safe_int(Some("-12")), Some(-12));
        assert_eq!(safe_int(None), None);
        assert_eq!(safe_int(Some("many")), None);
    }

    #[test]
    fn test_safe_int_truncates_toward_zero() {
        assert_eq!(safe_int(Some("3.9")), Some(3));
        assert_eq!(safe_int(Some("-3.9")), Some(-3));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date(Some("2024-03-15")), expected);
        assert_eq!(parse_date(Some("15/03/2024")), expected);
        assert_eq!(parse_date(Some("20240315")), expected);
        assert_eq!(parse_date(Some("2024-03-15T08:30:00Z")), expected);
    }

    #[test]
    fn test_parse_date_fallback_is_today() {
        let today = Utc::now().date_naive();
        assert_eq!(parse_date(Some("not a date")), today);
        assert_eq!(parse_date(None), today);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let parsed = parse_datetime(Some("2024-03-15 08:30:00"));
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        let rfc = parse_datetime(Some("2024-03-15T08:30:00+04:00"));
        assert_eq!(rfc, Utc.with_ymd_and_hms(2024, 3, 15, 4, 30, 0).unwrap());

        let date_only = parse_datetime(Some("2024-03-15"));
        assert_eq!(date_only, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_fallback_is_now() {
        let before = Utc::now();
        let parsed = parse_datetime(Some("garbled"));
        let after = Utc::now();
        assert!(parsed >= before && parsed <= after);
    }
}
