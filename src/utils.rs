use chrono::{Local, NaiveDate};

use crate::error::{Error, Result};

/// Clean a raw HTML table cell: drop CR/LF pairs and surrounding whitespace.
/// Lone `\n` characters inside the text are kept; the header-strip heuristic
/// in `services::ingest` relies on them.
pub fn clean_cell(value: &str) -> String {
    value.replace("\r\n", "").trim().to_string()
}

/// Parse an integer cell that may carry thousands separators ("300,000").
pub fn parse_int(value: &str) -> Result<u64> {
    let cleaned = value.replace(',', "");
    cleaned
        .parse::<u64>()
        .map_err(|e| Error::Parse(format!("Invalid integer '{}': {}", value, e)))
}

/// Parse a date cell in `%m/%d/%Y` format. Cells containing a colon are the
/// source's intraday "as of HH:MM" placeholder and resolve to today's date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    if value.contains(':') {
        return Ok(Local::now().date_naive());
    }

    NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .map_err(|e| Error::Parse(format!("Invalid date '{}': {}", value, e)))
}

/// URL-safe slug for an insider name: lowercase alphanumerics with single
/// hyphens between words. Computed once at creation time and never
/// recomputed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_hyphen = true; // suppress a leading hyphen

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_strips_thousands_separators() {
        assert_eq!(parse_int("300,000").unwrap(), 300000);
        assert_eq!(parse_int("1").unwrap(), 1);
        assert_eq!(parse_int("12,345,678").unwrap(), 12345678);
    }

    #[test]
    fn test_parse_int_rejects_garbage() {
        assert!(parse_int("12.5").is_err());
        assert!(parse_int("-3").is_err());
        assert!(parse_int("").is_err());
    }

    #[test]
    fn test_parse_date_month_day_year() {
        assert_eq!(
            parse_date("11/18/2018").unwrap(),
            NaiveDate::from_ymd_opt(2018, 11, 18).unwrap()
        );
    }

    #[test]
    fn test_parse_date_intraday_placeholder_is_today() {
        assert_eq!(parse_date("10:32am").unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_date_rejects_malformed() {
        assert!(parse_date("2018-11-18").is_err());
        assert!(parse_date("18/40/2018").is_err());
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  120.30\r\n "), "120.30");
        assert_eq!(clean_cell("a\r\nb"), "ab");
        // Lone newlines inside the text survive cleaning.
        assert_eq!(clean_cell(" a\nb "), "a\nb");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Jeffrey Leboski"), "jeffrey-leboski");
        assert_eq!(slugify("O'Brien, Conan"), "o-brien-conan");
        assert_eq!(slugify("  Dude  "), "dude");
    }
}
