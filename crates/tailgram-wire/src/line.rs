//! The stamped line codec.
//!
//! Every message is persisted as one text line of the form
//! `[YY.MM.DD] [HH.MM.SS] {ROLE} -> {text}`. Parsing never fails: a
//! line that does not match the grammar degrades to a fallback record
//! carrying the sentinel stamp and the raw trimmed text, so every byte
//! written to a log is eventually visible to a consumer.

use chrono::{DateTime, Local, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::role::Role;

/// Stamp shown for lines that do not carry a parseable timestamp.
pub const SENTINEL_STAMP: &str = "[..] [..]";

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[(\d{2}\.\d{2}\.\d{2})\]\s+\[(\d{2}\.\d{2}\.\d{2})\]\s*(?:\{((?i:ME|THEM))\}\s*->\s*)?\{(.*)\}\s*$",
    )
    .expect("line pattern")
});

/// One parsed (or fallback) line of a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// `[YY.MM.DD] [HH.MM.SS]` as stored, or [`SENTINEL_STAMP`].
    pub stamp: String,
    /// Role tag embedded in the line, when present.
    pub role: Option<Role>,
    pub text: String,
    /// Merge instant in UTC milliseconds. Fallback records are given
    /// the parse time, so on every reload they sort as newest.
    pub instant_ms: i64,
    /// False when the line did not match the grammar.
    pub structured: bool,
}

/// A formatted line together with the stamp it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedLine {
    pub line: String,
    pub date: String,
    pub time: String,
}

impl StampedLine {
    /// The bracketed stamp pair as a consumer renders it.
    pub fn stamp(&self) -> String {
        format!("[{}] [{}]", self.date, self.time)
    }
}

/// Collapse embedded line breaks into spaces and trim surrounding
/// whitespace, making the text safe to store as a single log line.
pub fn sanitize(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}

/// Format `text` as a stored line stamped with the current local time.
pub fn format_line(text: &str, role: Role) -> StampedLine {
    format_line_at(text, role, Local::now())
}

/// Format `text` as a stored line stamped with `at`.
pub fn format_line_at(text: &str, role: Role, at: DateTime<Local>) -> StampedLine {
    let date = at.format("%y.%m.%d").to_string();
    let time = at.format("%H.%M.%S").to_string();
    let line = format!("[{}] [{}] {{{}}} -> {{{}}}", date, time, role.tag(), sanitize(text));
    StampedLine { line, date, time }
}

/// Parse one stored line, falling back to a sentinel record if it does
/// not match the grammar.
pub fn parse_line(line: &str) -> LineRecord {
    parse_line_at(line, Utc::now().timestamp_millis())
}

/// Parse one stored line. `now_ms` is the instant assigned to records
/// whose timestamp cannot be derived; they sort as newest in a merged
/// history.
pub fn parse_line_at(line: &str, now_ms: i64) -> LineRecord {
    match LINE_RE.captures(line) {
        Some(caps) => {
            let date = &caps[1];
            let time = &caps[2];
            let role = caps.get(3).and_then(|tag| Role::from_tag(tag.as_str()));
            LineRecord {
                stamp: format!("[{date}] [{time}]"),
                role,
                text: caps[4].to_string(),
                instant_ms: instant_from_stamp(date, time).unwrap_or(now_ms),
                structured: true,
            }
        }
        None => LineRecord {
            stamp: SENTINEL_STAMP.to_string(),
            role: None,
            text: line.trim().to_string(),
            instant_ms: now_ms,
            structured: false,
        },
    }
}

/// Derive a UTC instant from the stored stamp fields. Two-digit years
/// are read as `2000 + YY`; existing logs depend on this rule, which
/// holds until 2100.
fn instant_from_stamp(date: &str, time: &str) -> Option<i64> {
    let mut date_parts = date.split('.');
    let yy: i32 = date_parts.next()?.parse().ok()?;
    let month: u32 = date_parts.next()?.parse().ok()?;
    let day: u32 = date_parts.next()?.parse().ok()?;
    let mut time_parts = time.split('.');
    let hour: u32 = time_parts.next()?.parse().ok()?;
    let minute: u32 = time_parts.next()?.parse().ok()?;
    let second: u32 = time_parts.next()?.parse().ok()?;
    Utc.with_ymd_and_hms(2000 + yy, month, day, hour, minute, second)
        .single()
        .map(|instant| instant.timestamp_millis())
}
