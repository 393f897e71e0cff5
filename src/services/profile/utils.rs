use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ColumnKind;

static DATE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)date|datum").expect("date name pattern is valid")
});

const NULL_TOKENS: [&str; 12] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

// Month-first before day-first for slashes, so 03/04/2024 reads as March 4th.
const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
];

/// Does the column name suggest date content (`date` or `datum`, any case)?
pub fn is_date_like_name(name: &str) -> bool {
    DATE_NAME.is_match(name)
}

/// Normalises a raw cell: trims it and maps empty cells and null tokens to `None`.
pub fn clean_cell(raw: Option<&str>) -> Option<&str> {
    let value = raw?.trim();
    if value.is_empty() || NULL_TOKENS.contains(&value) {
        None
    } else {
        Some(value)
    }
}

/// Finite numbers only: `NAN`, `inf` and friends are not values.
pub fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a date or date-time string; `None` when no known format matches.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Infers the tag for a column from its name and its cleaned cells.
pub fn detect_column_kind(name: &str, values: &[Option<&str>]) -> ColumnKind {
    if is_date_like_name(name) {
        return ColumnKind::DateTime;
    }
    if values.is_empty() {
        return ColumnKind::Text;
    }

    let mut total_count = 0;
    let mut numeric_count = 0;
    for value in values.iter().flatten() {
        total_count += 1;
        if parse_number(value).is_some() {
            numeric_count += 1;
        }
    }

    // An all-missing column reads as numeric with every cell missing.
    if total_count == 0 {
        return ColumnKind::Numeric;
    }

    if numeric_count as f64 / total_count as f64 > 0.5 {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

/// `part / whole * 100` rounded to two decimals, 0 for an empty whole.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Truncates to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Bit pattern used for distinct counting; folds `-0.0` into `0.0`.
pub fn float_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn date_names_match_case_insensitively() {
        assert!(is_date_like_name("date"));
        assert!(is_date_like_name("Order_Date"));
        assert!(is_date_like_name("DATUM_PRODEJE"));
        assert!(!is_date_like_name("revenue"));
        assert!(!is_date_like_name("day"));
    }

    #[test]
    fn null_tokens_are_missing() {
        assert_eq!(clean_cell(None), None);
        assert_eq!(clean_cell(Some("   ")), None);
        assert_eq!(clean_cell(Some("NaN")), None);
        assert_eq!(clean_cell(Some("N/A")), None);
        assert_eq!(clean_cell(Some(" 42 ")), Some("42"));
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for s in ["2024-01-02", "2024/01/02", "01/02/2024", "02.01.2024", "2024-01-02 13:45:00", "2024-01-02T13:45:00.250"] {
            let parsed = parse_datetime(s).unwrap_or_else(|| panic!("failed on {}", s));
            assert_eq!(parsed.date(), expected, "{}", s);
        }

        let with_offset = parse_datetime("2024-01-02T23:30:00+02:00").unwrap();
        assert_eq!(with_offset.date(), expected);
        assert_eq!(with_offset.hour(), 23);
    }

    #[test]
    fn day_first_slash_dates_fall_back() {
        let parsed = parse_datetime("25/12/2023").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
    }

    #[test]
    fn garbage_dates_are_rejected() {
        assert_eq!(parse_datetime("x"), None);
        assert_eq!(parse_datetime("2024-13-01"), None);
        assert_eq!(parse_datetime("100"), None);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        for s in ["NAN", "Nan", "INF", "-inf", "infinity"] {
            assert_eq!(parse_number(s), None, "{}", s);
        }
    }

    #[test]
    fn majority_numeric_column_is_numeric() {
        let values = [Some("100"), Some("50"), Some("x")];
        assert_eq!(detect_column_kind("revenue", &values), ColumnKind::Numeric);

        let values = [Some("a"), Some("b"), Some("1")];
        assert_eq!(detect_column_kind("label", &values), ColumnKind::Text);
    }

    #[test]
    fn column_kind_edge_cases() {
        assert_eq!(detect_column_kind("a", &[]), ColumnKind::Text);
        assert_eq!(detect_column_kind("a", &[None, None]), ColumnKind::Numeric);
        assert_eq!(detect_column_kind("ship_date", &[Some("100")]), ColumnKind::DateTime);
    }

    #[test]
    fn percentage_rounds_and_guards_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("abc", 50), "abc");
        assert_eq!(truncate_chars("žluťoučký", 4), "žluť");
        assert_eq!(truncate_chars(&"x".repeat(60), 50).len(), 50);
    }

    #[test]
    fn negative_zero_folds() {
        assert_eq!(float_key(-0.0), float_key(0.0));
        assert_ne!(float_key(1.0), float_key(-1.0));
    }
}
