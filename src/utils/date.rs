//! Front-matter date parsing and formatting.
//!
//! Entry dates are written by hand, so several textual shapes are accepted:
//!
//! | Input                        | Parsed as               |
//! |------------------------------|-------------------------|
//! | `2021-06-03`                 | 2021-06-03 00:00:00     |
//! | `2021-06-03 14:30`           | 2021-06-03 14:30:00     |
//! | `2021-06-03T14:30:00-03:00`  | 2021-06-03 14:30:00     |
//! | `June 3 2021`, `Jun 3, 2021` | 2021-06-03 00:00:00     |
//! | `3 June 2021`                | 2021-06-03 00:00:00     |
//! | `Thu, 03 Jun 2021 10:00:00 +0000` | 2021-06-03 10:00:00 |
//!
//! Offsets are dropped: the wall-clock time the author wrote is kept.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// Parse a hand-written date. Returns `None` for anything unrecognized.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_local());
    }

    let text = strip_weekday(text);

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Drop a leading weekday name ("Thu, June 3 2021" → "June 3 2021").
fn strip_weekday(text: &str) -> &str {
    let Some((first, rest)) = text.split_once(char::is_whitespace) else {
        return text;
    };
    let word = first.trim_end_matches(',').to_ascii_lowercase();
    let is_weekday = WEEKDAYS
        .iter()
        .any(|w| word.starts_with(w) && (word.len() == 3 || word.ends_with("day")));
    if is_weekday { rest.trim_start() } else { text }
}

/// Lowercase three-letter English month abbreviation (`6` → `"jun"`).
pub fn month_abbr(date: &NaiveDateTime) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// Zero-padded two-digit month (`6` → `"06"`), used as archive bucket key.
pub fn month_key(date: &NaiveDateTime) -> String {
    format!("{:02}", date.month())
}

/// Format as RFC 2822 for feeds, treating the wall-clock time as UTC.
pub fn to_rfc2822(date: &NaiveDateTime) -> String {
    date.and_utc().to_rfc2822()
}
