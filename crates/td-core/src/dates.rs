//! Date parsing for heterogeneous trial date strings

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::value::CellValue;

/// Formats tried after the slash-delimited forms
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a date string, returning `None` for anything that is not a real
/// calendar date.
///
/// Three slash-separated parts are read as `MM/DD/YYYY` (zero padding
/// optional), or `YYYY/MM/DD` when the first part is a four-digit year.
/// Everything else goes through ISO-like parsing.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 3 {
        return if parts[0].trim().len() == 4 {
            date_from_parts(parts[0], parts[1], parts[2])
        } else {
            date_from_parts(parts[2], parts[0], parts[1])
        };
    }

    parse_iso_like(s)
}

fn date_from_parts(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year = year.trim();
    if year.len() != 4 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_iso_like(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Date reading of a cell. Only text cells can hold dates.
pub fn parse_cell_date(value: &CellValue) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date)
}

/// Total order over optional dates with missing dates first.
pub fn compare_optional_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

/// Format a date for filter inputs (`MM/DD/YYYY`)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}
