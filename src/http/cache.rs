//! HTTP cache validation module
//!
//! `Last-Modified` generation and `If-Modified-Since` handling for static files.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Check whether the client's copy is still fresh
///
/// Returns true (send 304) only when `If-Modified-Since` parses and the file
/// was not modified after it, compared at one-second resolution. An
/// `If-None-Match` header disables the check.
pub fn not_modified_since(
    if_modified_since: Option<&str>,
    if_none_match_present: bool,
    modified: SystemTime,
) -> bool {
    if if_none_match_present {
        return false;
    }
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

/// Parse an HTTP date header value
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
