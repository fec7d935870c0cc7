use std::sync::LazyLock;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static DD_MM_YYYY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("static pattern"));

/// Parse a stored or user-supplied date.
///
/// Accepted shapes:
/// - RFC 3339 / ISO-8601 with offset: `1900-01-01T00:00:00.000Z`
/// - ISO-8601 without offset (read as UTC): `1900-01-01T00:00:00`
/// - bare ISO date (midnight UTC): `1900-01-01`
/// - `dd/mm/yyyy` (midnight UTC): `01/01/1900`
///
/// Anything else yields `None`.
pub fn parse_date_string(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = DD_MM_YYYY.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Leading-integer parse: `"50abc"` -> 50, `"abc"` -> None.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// "Any"-style values mean "no constraint" for a criterion.
pub fn is_any_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == "Any" || v == "any"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_supported_shapes() {
        let expected = Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date_string("1900-01-01T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_date_string("1900-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_date_string("1900-01-01"), Some(expected));
        assert_eq!(parse_date_string("01/01/1900"), Some(expected));
    }

    #[test]
    fn day_comes_before_month_in_slash_format() {
        let parsed = parse_date_string("02/03/1901").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(1901, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_and_impossible_dates() {
        assert_eq!(parse_date_string("sometime in 1900"), None);
        assert_eq!(parse_date_string("31/02/1900"), None);
        assert_eq!(parse_date_string(""), None);
    }

    #[test]
    fn leading_int() {
        assert_eq!(parse_leading_int("25"), Some(25));
        assert_eq!(parse_leading_int("50abc"), Some(50));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("all"), None);
    }

    #[test]
    fn sentinels() {
        assert!(is_any_sentinel("Any"));
        assert!(is_any_sentinel("any"));
        assert!(is_any_sentinel(""));
        assert!(!is_any_sentinel("Female"));
    }
}
