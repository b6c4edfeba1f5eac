//! HTTP cache validation module
//!
//! `ETag` derivation and conditional request evaluation
//! (`If-None-Match`, `If-Modified-Since`).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Derive an `ETag` from a file's identity and metadata.
///
/// Hashes path + last-modified + size, so the tag is stable across
/// reads of an unchanged file and changes whenever the file does.
///
/// # Returns
/// Quoted `ETag` string, e.g. `"1a2b3c4d"`
pub fn resource_etag(path: &Path, modified: SystemTime, size: u64) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    size.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if the client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single `ETag`, a comma-separated list, and the `*` wildcard.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// Format a timestamp as an RFC 7231 IMF-fixdate for `Last-Modified`,
/// e.g. `Wed, 21 Oct 2015 07:28:00 GMT`.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse an `If-Modified-Since` header value.
///
/// Only the IMF-fixdate form is accepted; the obsolete RFC 850 and
/// asctime forms are treated as absent.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(SystemTime::from)
}

/// Decide whether a conditional GET should receive `304 Not Modified`.
///
/// `If-None-Match` takes precedence over `If-Modified-Since` when both
/// are present (RFC 9110 §13.1.3). Modification times are compared at
/// one-second granularity, matching the header's resolution.
pub fn check_not_modified(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: &str,
    modified: SystemTime,
) -> bool {
    if if_none_match.is_some() {
        return check_etag_match(if_none_match, etag);
    }

    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| {
            let modified_secs = modified
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            let since_secs = since
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            modified_secs <= since_secs
        })
}
