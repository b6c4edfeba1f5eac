//! Response compression module
//!
//! Content-encoding negotiation and gzip encoding for textual bodies.
//! Eligibility is decided by a configured MIME allow-list, never by
//! sniffing, so already-compressed types cannot be double-compressed.

use std::collections::HashSet;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use super::mime;

/// Check whether the client accepts gzip.
///
/// Parses the `Accept-Encoding` list, honoring `q=0` refusals
/// (`gzip;q=0` means the client explicitly rejects gzip).
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(header) = accept_encoding else {
        return false;
    };

    header.split(',').any(|entry| {
        let mut parts = entry.split(';');
        let coding = parts.next().unwrap_or("").trim();
        if !coding.eq_ignore_ascii_case("gzip") {
            return false;
        }
        // No parameters means accepted at default quality
        parts.all(|p| {
            let p = p.trim();
            match p.strip_prefix("q=") {
                Some(q) => q.trim().parse::<f32>().map_or(true, |v| v > 0.0),
                None => true,
            }
        })
    })
}

/// Check whether a Content-Type is in the compressible allow-list.
///
/// Parameters are stripped before lookup, so `text/html; charset=utf-8`
/// matches an allow-list entry of `text/html`.
pub fn is_compressible(content_type: &str, allow_list: &HashSet<String>) -> bool {
    allow_list.contains(&mime::essence(content_type).to_ascii_lowercase())
}

/// gzip-encode a buffered body.
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
