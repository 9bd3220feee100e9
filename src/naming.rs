//! Centralized filename parsing for the `[yyyy-MM-dd-]name[_Title|_None]` convention.
//!
//! Pages and posts share one filename grammar:
//!
//! - An optional `yyyy-MM-dd-` date prefix. Posts must carry one; pages may.
//! - The name itself, which becomes the output filename (`name.html`).
//! - An optional `_Title` suffix overriding the generated title, or the
//!   `_None` sentinel which keeps the generated title for `<title>` but
//!   suppresses the heading/date block on the rendered post.
//!
//! ## Display Titles
//!
//! Without a suffix the title is the name with dashes turned into spaces and
//! each word title-cased:
//! - `2024-03-09-first-light` → "First Light"
//! - `2024-03-09-first-light_Dawn` → "Dawn"
//! - `2024-03-09-first-light_None` → "First Light" (heading suppressed)

use chrono::NaiveDate;

/// Length of the `yyyy-MM-dd` date prefix.
pub const DATE_PREFIX_LEN: usize = 10;

/// Title suffix that suppresses the generated post heading.
pub const NO_TITLE_SENTINEL: &str = "None";

/// Result of parsing a content filename stem.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date from a valid `yyyy-MM-dd-` prefix.
    pub date: Option<NaiveDate>,
    /// Output link stem: the name with date prefix and `_suffix` removed.
    pub archive_name: String,
    /// Title derived from the filename alone.
    pub title: String,
    /// True for the `_None` sentinel.
    pub suppress_heading: bool,
}

/// Parse the `yyyy-MM-dd` prefix of a filename stem.
///
/// The prefix must be followed by a `-` separator and at least one more
/// character. Month and day need their leading zeros.
pub fn parse_date_prefix(stem: &str) -> Option<NaiveDate> {
    let bytes = stem.as_bytes();
    if bytes.len() <= DATE_PREFIX_LEN + 1 || bytes[DATE_PREFIX_LEN] != b'-' {
        return None;
    }
    let well_formed = bytes[..DATE_PREFIX_LEN]
        .iter()
        .enumerate()
        .all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(&stem[..DATE_PREFIX_LEN], "%Y-%m-%d").ok()
}

/// Parse a content filename stem.
///
/// Handles these patterns:
/// - `"2024-01-05-hello-world"` → date, archive "hello-world", title "Hello World"
/// - `"2024-01-05-hello_Greetings"` → date, archive "hello", title "Greetings"
/// - `"2024-01-05-hello_None"` → date, archive "hello", title "Hello", heading suppressed
/// - `"about-me"` → no date, archive "about-me", title "About Me"
/// - `"2024-01-05-"` → no date (nothing after the prefix), archive "2024-01-05-"
pub fn parse_entry_name(stem: &str) -> ParsedName {
    let date = parse_date_prefix(stem);
    let remainder = match date {
        Some(_) => &stem[DATE_PREFIX_LEN + 1..],
        None => stem,
    };

    let (name, suffix) = match remainder.split_once('_') {
        Some((name, suffix)) => (name, Some(suffix)),
        None => (remainder, None),
    };

    let (title, suppress_heading) = match suffix {
        Some(NO_TITLE_SENTINEL) => (display_title(name), true),
        Some(custom) => (custom.to_string(), false),
        None => (display_title(name), false),
    };

    ParsedName {
        date,
        archive_name: name.to_string(),
        title,
        suppress_heading,
    }
}

/// Dashes to spaces, then title case.
pub fn display_title(name: &str) -> String {
    title_case(&name.replace('-', " "))
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// Words written entirely in uppercase are kept as-is so acronyms survive
/// (`"intro to CSS"` → `"Intro To CSS"`).
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let has_lower = word.chars().any(char::is_lowercase);
            let has_upper = word.chars().any(char::is_uppercase);
            if has_upper && !has_lower {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Long-form display date used in post headings, e.g. `5 January 2024`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// ISO date used in archive listings, e.g. `2024-01-05`.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
