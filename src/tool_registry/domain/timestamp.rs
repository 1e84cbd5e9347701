//! Text form of the last-connection timestamp.

use chrono::NaiveDateTime;

/// Storage format for connection timestamps, e.g. `2025-03-14 09:26:53`.
pub const CONNECTION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a connection time; `None` renders as an empty string.
#[must_use]
pub fn format_connection_time(value: Option<NaiveDateTime>) -> String {
    value.map_or_else(String::new, |time| {
        time.format(CONNECTION_TIME_FORMAT).to_string()
    })
}

/// Parses a stored connection time.
///
/// Empty or unparseable values yield `None`.
#[must_use]
pub fn parse_connection_time(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, CONNECTION_TIME_FORMAT).ok()
}
