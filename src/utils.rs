//! # Utility Functions
//!
//! Helpers shared across the client core: URL assembly, identifier
//! generation and small display formatting routines.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Joins an endpoint path onto the API base URL with exactly one slash between them.
///
/// ```rust
/// use time_capsule_client::utils::join_url;
///
/// assert_eq!(
///     join_url("http://localhost:8000/api/", "/capsules/"),
///     "http://localhost:8000/api/capsules/"
/// );
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Appends `key=value` pairs as a query string.
pub fn with_query(url: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url;
    }
    let pairs: Vec<String> = query
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, pairs.join("&"))
}

/// Percent-encodes one URL path segment (`a/b` → `a%2Fb`).
pub fn path_segment(raw: &str) -> String {
    encode_component(raw)
}

fn encode_component(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

/// `scheme://host[:port]` of an absolute URL.
pub fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find('/')
        .map_or(url.len(), |i| scheme_end + i);
    Some(&url[..host_end])
}

/// Resolves a server-relative media path (`/media/...`) against the API origin.
pub fn media_url(api_base_url: &str, file: &str) -> String {
    if file.contains("://") {
        return file.to_string();
    }
    match origin_of(api_base_url) {
        Some(origin) => join_url(origin, file),
        None => file.to_string(),
    }
}

/// Generates a sortable correlation identifier: `{timestamp}-{uuid}`.
pub fn generate_request_id() -> String {
    let uuid_part = Uuid::new_v4().to_string();
    let timestamp = Utc::now().timestamp_millis();
    format!("{}-{}", timestamp, uuid_part)
}

/// Upper-cases the first character (`"sealed"` → `"Sealed"`).
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Formats an ISO date (or datetime) as `May 1, 2030`.
///
/// Returns `None` when the value does not start with a `YYYY-MM-DD` date.
pub fn format_long_date(raw: &str) -> Option<String> {
    let date_part = raw.get(..10)?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some(date.format("%B %-d, %Y").to_string())
}
