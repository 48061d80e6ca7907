//! Field-level decoding for session log rows
//!
//! Numbers are read leniently: leading whitespace is skipped and the longest
//! numeric prefix is used, so `"72 bpm"` reads as 72. Decimal-comma handling
//! applies to HRV only.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Naive date-time layouts accepted for the timestamp column, tried in order
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Read the longest decimal number at the start of `raw`.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. Returns `None` when no digits are present.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();

    let mut number = String::with_capacity(len);
    let mut pos = 0;

    if pos < len && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        if bytes[pos] == b'-' {
            number.push('-');
        }
        pos += 1;
    }

    let int_start = pos;
    while pos < len && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = &s[int_start..pos];

    let mut frac_digits = "";
    if pos < len && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_digits = &s[frac_start..frac_end];
        if !int_digits.is_empty() || !frac_digits.is_empty() {
            pos = frac_end;
        }
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    number.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    if !frac_digits.is_empty() {
        number.push('.');
        number.push_str(frac_digits);
    }

    if pos < len && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_end = pos + 1;
        if exp_end < len && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            number.push('e');
            number.push_str(&s[pos + 1..exp_end]);
        }
    }

    number.parse::<f64>().ok()
}

/// Parse a heart-rate field. `None` means the row should be dropped.
pub fn parse_hr(field: &str) -> Option<f64> {
    parse_float_prefix(field).filter(|v| v.is_finite())
}

/// Parse an HRV field, normalizing a decimal comma.
///
/// Missing, empty or unparsable values read as `0.0`.
pub fn parse_hrv(field: Option<&str>) -> f64 {
    let normalized = match field {
        Some(value) if !value.is_empty() => value.replacen(',', ".", 1),
        _ => "0".to_string(),
    };

    parse_float_prefix(&normalized)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse a timestamp field into wall-clock time.
///
/// Offset-qualified RFC 3339 values keep their own local time.
pub fn parse_timestamp(field: &str) -> Option<NaiveDateTime> {
    let s = field.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Render a timestamp as time of day
pub fn render_time(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_prefix_plain_numbers() {
        assert_eq!(parse_float_prefix("70"), Some(70.0));
        assert_eq!(parse_float_prefix("  72.5"), Some(72.5));
        assert_eq!(parse_float_prefix("-3.25"), Some(-3.25));
        assert_eq!(parse_float_prefix("+8"), Some(8.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("1.5e2"), Some(150.0));
    }

    #[test]
    fn test_float_prefix_stops_at_garbage() {
        assert_eq!(parse_float_prefix("72 bpm"), Some(72.0));
        assert_eq!(parse_float_prefix("72,5"), Some(72.0));
        assert_eq!(parse_float_prefix("3e"), Some(3.0));
        assert_eq!(parse_float_prefix("3e+x"), Some(3.0));
    }

    #[test]
    fn test_float_prefix_rejects_non_numbers() {
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("NaN"), None);
        assert_eq!(parse_float_prefix("Infinity"), None);
    }

    #[test]
    fn test_hr_rejects_overflow() {
        assert_eq!(parse_hr("1e999"), None);
        assert_eq!(parse_hr("abc"), None);
        assert_eq!(parse_hr("88"), Some(88.0));
    }

    #[test]
    fn test_hrv_decimal_comma() {
        assert_eq!(parse_hrv(Some("12,5")), 12.5);
        assert_eq!(parse_hrv(Some("12.5")), 12.5);
    }

    #[test]
    fn test_hrv_defaults_to_zero() {
        assert_eq!(parse_hrv(None), 0.0);
        assert_eq!(parse_hrv(Some("")), 0.0);
        assert_eq!(parse_hrv(Some("n/a")), 0.0);
        assert_eq!(parse_hrv(Some("   ")), 0.0);
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap();

        assert_eq!(parse_timestamp("2024-01-15T10:30:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 10:30:05"), Some(expected));
        assert_eq!(parse_timestamp("2024/01/15 10:30:05"), Some(expected));
        assert_eq!(parse_timestamp("15.01.2024 10:30:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T10:30:05+02:00"), Some(expected));
    }

    #[test]
    fn test_timestamp_fractional_seconds() {
        let parsed = parse_timestamp("2024-01-15T10:30:05.123").unwrap();
        assert_eq!(render_time(&parsed), "10:30:05");
    }

    #[test]
    fn test_timestamp_without_seconds_and_date_only() {
        assert_eq!(
            parse_timestamp("2024-01-15T10:30").map(|t| render_time(&t)),
            Some("10:30:00".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-01-15 10:30").map(|t| render_time(&t)),
            Some("10:30:00".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-01-15").map(|t| render_time(&t)),
            Some("00:00:00".to_string())
        );
    }

    #[test]
    fn test_timestamp_invalid() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45T99:00:00"), None);
    }
}
