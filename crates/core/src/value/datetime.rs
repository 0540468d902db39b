//! Lenient timestamp parsing for values read back from the database.
//!
//! SQLite has no timestamp type, so stored timestamps arrive as text in
//! whatever layout the writer used: `CURRENT_TIMESTAMP` output, RFC 3339,
//! `T` or space separators, with or without fractions and UTC suffixes.
//! Every accepted layout is interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// UTC suffixes stripped before parsing, longest first.
const UTC_SUFFIXES: &[&str] = &["Z+00:00", "Z+00", "+00:00", "+00", "Z"];

const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses a timestamp string in any of the supported layouts.
///
/// Returns `None` when no layout matches.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = UTC_SUFFIXES
        .iter()
        .find_map(|suffix| input.strip_suffix(suffix))
        .unwrap_or(input);

    for layout in NAIVE_LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, layout) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn expected() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_space_separated() {
        assert_eq!(parse_datetime("2024-05-06 07:08:09"), Some(expected()));
    }

    #[test]
    fn test_t_separated_with_zulu() {
        assert_eq!(parse_datetime("2024-05-06T07:08:09Z"), Some(expected()));
    }

    #[test]
    fn test_utc_offset_suffixes() {
        assert_eq!(parse_datetime("2024-05-06 07:08:09+00:00"), Some(expected()));
        assert_eq!(parse_datetime("2024-05-06 07:08:09+00"), Some(expected()));
        assert_eq!(parse_datetime("2024-05-06T07:08:09Z+00"), Some(expected()));
    }

    #[test]
    fn test_fractional_seconds() {
        let parsed = parse_datetime("2024-05-06 07:08:09.250").unwrap();
        assert_eq!(parsed.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_date_only_is_midnight() {
        let parsed = parse_datetime("2024-05-06").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_non_utc_offset_is_converted() {
        let parsed = parse_datetime("2024-05-06T09:08:09+02:00").unwrap();
        assert_eq!(parsed, expected());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(parse_datetime(""), None);
    }
}
