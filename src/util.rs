use std::io::Read;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Resolve a date string to a NaiveDate, defaulting to today.
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => parse_date_arg(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Parse an optional YYYY-MM-DD argument.
pub fn optional_date(date: Option<&str>) -> Result<Option<NaiveDate>> {
    date.map(parse_date_arg).transpose()
}

fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

/// The evaluation instant: an RFC 3339 timestamp, or the local time now.
pub fn resolve_now(now: Option<&str>) -> Result<DateTime<FixedOffset>> {
    match now {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid timestamp '{s}', expected RFC 3339")),
        None => Ok(chrono::Local::now().fixed_offset()),
    }
}

/// Read a JSON document from a file path, or from stdin when `source` is "-".
pub fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }

    std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn resolve_date_explicit() {
        let date = resolve_date(Some("2026-02-08")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 8).unwrap());
    }

    #[test]
    fn resolve_date_today() {
        let date = resolve_date(None).unwrap();
        assert_eq!(date, chrono::Local::now().date_naive());
    }

    #[test]
    fn resolve_date_invalid() {
        let err = resolve_date(Some("not-a-date")).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn optional_date_passes_none_through() {
        assert!(optional_date(None).unwrap().is_none());
        assert!(optional_date(Some("2026-13-01")).is_err());
    }

    #[test]
    fn resolve_now_keeps_offset() {
        let now = resolve_now(Some("2026-03-01T21:30:00+02:00")).unwrap();
        assert_eq!(now.hour(), 21);
        assert!(resolve_now(Some("21:30")).is_err());
    }

    #[test]
    fn read_input_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("record.json");
        std::fs::write(&path, r#"{"weight": 5.2}"#).unwrap();
        let contents = read_input(path.to_str().unwrap()).unwrap();
        assert!(contents.contains("5.2"));
        assert!(read_input(tmp.path().join("missing.json").to_str().unwrap()).is_err());
    }
}
