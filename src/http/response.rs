//! HTTP response building module
//!
//! Builders for the status codes the file server emits. Every builder
//! sets an exact `Content-Length` via the body it installs; HEAD
//! responses keep the headers of the corresponding GET with an empty body.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Validation and caching headers shared by 200/206 responses
pub struct CacheHeaders<'a> {
    pub etag: &'a str,
    pub last_modified: &'a str,
    pub cache_control: &'a str,
}

/// Build a 200 response for a full file body.
///
/// `encoding` carries an applied `Content-Encoding` (gzip); when set,
/// `Vary: Accept-Encoding` is added and `Content-Length` reflects the
/// encoded size.
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    encoding: Option<&'static str>,
    cache: &CacheHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", cache.etag)
        .header("Last-Modified", cache.last_modified)
        .header("Cache-Control", cache.cache_control);

    if let Some(enc) = encoding {
        builder = builder
            .header("Content-Encoding", enc)
            .header("Vary", "Accept-Encoding");
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build a 206 Partial Content response
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    cache: &CacheHeaders<'_>,
    start: usize,
    end: usize,
    total_size: usize,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = end - start + 1;
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", cache.etag)
        .header("Last-Modified", cache.last_modified)
        .header("Cache-Control", cache.cache_control)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a 304 Not Modified response (no body, validator only)
pub fn build_304_response(etag: &str, cache_control: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", cache_control)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a 403 Forbidden response
pub fn build_403_response() -> Response<Full<Bytes>> {
    build_plain_error(403, "403 Forbidden")
}

/// Build a 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_plain_error(404, "404 Not Found")
}

/// Build a 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build a 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{file_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build a 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_plain_error(500, "500 Internal Server Error")
}

/// Build an OPTIONS response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn build_plain_error(status: u16, message: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(message)))
        .unwrap_or_else(|e| {
            log_build_error(message, &e);
            Response::new(Full::new(Bytes::from(message)))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_headers() -> CacheHeaders<'static> {
        CacheHeaders {
            etag: "\"abc\"",
            last_modified: "Sun, 06 Nov 1994 08:49:37 GMT",
            cache_control: "public, max-age=86400",
        }
    }

    #[test]
    fn test_file_response_headers() {
        let cache = cache_headers();
        let resp = build_file_response(
            Bytes::from_static(b"hello"),
            "text/plain; charset=utf-8",
            None,
            &cache,
            false,
        );
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Length"], "5");
        assert_eq!(resp.headers()["ETag"], "\"abc\"");
        assert_eq!(resp.headers()["Cache-Control"], "public, max-age=86400");
        assert!(resp.headers().get("Content-Encoding").is_none());
    }

    #[test]
    fn test_encoded_response_headers() {
        let cache = cache_headers();
        let resp = build_file_response(
            Bytes::from_static(b"zzz"),
            "text/html; charset=utf-8",
            Some("gzip"),
            &cache,
            false,
        );
        assert_eq!(resp.headers()["Content-Encoding"], "gzip");
        assert_eq!(resp.headers()["Vary"], "Accept-Encoding");
        assert_eq!(resp.headers()["Content-Length"], "3");
    }

    #[test]
    fn test_head_keeps_length_drops_body() {
        let cache = cache_headers();
        let resp = build_file_response(
            Bytes::from_static(b"hello"),
            "text/plain",
            None,
            &cache,
            true,
        );
        assert_eq!(resp.headers()["Content-Length"], "5");
    }

    #[test]
    fn test_partial_response() {
        let cache = cache_headers();
        let resp = build_partial_response(
            Bytes::from_static(b"ell"),
            "text/plain",
            &cache,
            1,
            3,
            5,
            false,
        );
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Range"], "bytes 1-3/5");
        assert_eq!(resp.headers()["Content-Length"], "3");
    }

    #[test]
    fn test_304_has_no_length_mismatch() {
        let resp = build_304_response("\"abc\"", "public, max-age=86400");
        assert_eq!(resp.status(), 304);
        assert!(resp.headers().get("Content-Length").is_none());
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(build_403_response().status(), 403);
        assert_eq!(build_404_response().status(), 404);
        assert_eq!(build_405_response().status(), 405);
        assert_eq!(build_416_response(10).status(), 416);
        assert_eq!(build_500_response().status(), 500);
        assert_eq!(build_options_response().status(), 204);
    }
}
