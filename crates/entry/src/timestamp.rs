//! Permissive timestamp parsing and the canonical output profile.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc,
};

/// Formats carrying their own offset
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Formats without an offset, read as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%a %b %e %H:%M:%S %Y",
    "%a %b %e %H:%M:%S%.f %Y",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Zone names chrono cannot read; all of them mean UTC
const UTC_NAMES: &[&str] = &["UTC", "GMT", "UT", "Z"];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
];

/// Render a timestamp in the canonical profile (RFC 3339, whole seconds).
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current wall-clock time, truncated to the canonical profile's precision.
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().trunc_subsecs(0).fixed_offset()
}

/// Parse a timestamp written in any of the common textual layouts.
///
/// Returns `None` when nothing matches.
pub fn parse_timestamp(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    parse_layout(input).or_else(|| normalize(input).and_then(|retry| parse_layout(&retry)))
}

fn parse_layout(input: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(input) {
        return Some(ts);
    }
    if let Some(ts) = parse_epoch(input) {
        return Some(ts);
    }

    ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
                .map(as_utc)
        })
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(as_utc)
        })
}

/// Rewrite `input` into a form the layout tables know: UTC zone names are
/// dropped, whitespace runs collapse to one space, and a comma before
/// fractional seconds becomes a dot.
///
/// `None` when the rewrite changes nothing.
fn normalize(input: &str) -> Option<String> {
    let mut normalized = input
        .split_whitespace()
        .filter(|token| !UTC_NAMES.contains(token))
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(comma) = fraction_comma(&normalized) {
        normalized.replace_range(comma..=comma, ".");
    }

    (!normalized.is_empty() && normalized != input).then_some(normalized)
}

/// Byte offset of the `,` in `HH:MM:SS,fff`
fn fraction_comma(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let is_fraction = b == b','
            && i >= 3
            && bytes[i - 3] == b':'
            && bytes[i - 2].is_ascii_digit()
            && bytes[i - 1].is_ascii_digit()
            && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
        is_fraction.then_some(i)
    })
}

/// Unix seconds (up to 10 digits) or milliseconds (13 digits)
fn parse_epoch(input: &str) -> Option<DateTime<FixedOffset>> {
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = input.parse().ok()?;
    let ts = match input.len() {
        1..=10 => DateTime::from_timestamp(value, 0)?,
        13 => DateTime::from_timestamp_millis(value)?,
        _ => return None,
    };
    Some(ts.fixed_offset())
}

fn as_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}
