//! Cell-level type coercion
//!
//! Every parser returns `None` for a value it cannot interpret. A failed
//! coercion never fails the row by itself; only the standardizers decide
//! which nulls make a row unusable.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%b %d, %Y", "%d-%b-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Integer cell; accepts integral floats such as `1610612737.0`
pub fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Floating cell; NaN and infinities read as null
pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Calendar date from a date or datetime cell
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Boolean cell in any of the spellings seen in exports
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" | "home" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "0.0" | "away" => Some(false),
        _ => None,
    }
}

/// Minutes played from a numeric value or `MM:SS` text
pub fn parse_minutes(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Some((mm, ss)) = s.split_once(':') {
        let mm = parse_float(mm)?;
        let ss = parse_float(ss)?;
        return Some(mm + ss / 60.0);
    }
    parse_float(s)
}

/// Non-blank text cell
pub fn parse_text(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int(" 1610612737.0 "), Some(1610612737));
        assert_eq!(parse_int("1.5"), None);
        assert_eq!(parse_int("abc"), None);
    }

    #[test]
    fn test_parse_float_rejects_nan() {
        assert_eq!(parse_float("0.455"), Some(0.455));
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 11, 1).unwrap();
        assert_eq!(parse_date("2021-11-01"), Some(expected));
        assert_eq!(parse_date("2021-11-01 00:00:00"), Some(expected));
        assert_eq!(parse_date("2021-11-01T19:30:00"), Some(expected));
        assert_eq!(parse_date("11/01/2021"), Some(expected));
        assert_eq!(parse_date("NOV 01, 2021"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("32:45"), Some(32.75));
        assert_eq!(parse_minutes("30"), Some(30.0));
        assert_eq!(parse_minutes("30.5"), Some(30.5));
        assert_eq!(parse_minutes("n/a"), None);
        assert_eq!(parse_minutes("12:xx"), None);
    }
}
