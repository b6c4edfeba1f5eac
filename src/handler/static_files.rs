//! Static file serving module
//!
//! Resolves a request path under the document root, applies welcome-file
//! and conditional-GET handling, and builds the response, compressing
//! eligible bodies. Files are read fresh on every request; there is no
//! resource cache.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::ServerContext;
use crate::error::FileError;
use crate::handler::resolve;
use crate::http::range::RangeParseResult;
use crate::http::response::CacheHeaders;
use crate::http::{self, cache, compress, mime, response};
use crate::logger;

/// Request context for a single static file lookup
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
    pub accept_encoding: Option<String>,
}

/// Serve a static file request, mapping resolution failures onto
/// status codes. Never panics and never leaks paths to the client.
pub async fn serve(ctx: &RequestContext<'_>, state: &ServerContext) -> Response<Full<Bytes>> {
    match try_serve(ctx, state).await {
        Ok(resp) => resp,
        Err(FileError::Traversal) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            http::build_403_response()
        }
        Err(FileError::Forbidden) => http::build_403_response(),
        Err(FileError::NotFound) => http::build_404_response(),
        Err(FileError::Io(e)) => {
            logger::log_error(&format!("Failed to serve '{}': {e}", ctx.path));
            http::build_500_response()
        }
    }
}

async fn try_serve(
    ctx: &RequestContext<'_>,
    state: &ServerContext,
) -> Result<Response<Full<Bytes>>, FileError> {
    let mut file_path = resolve::resolve_path(&state.document_root, ctx.path)?;

    let mut meta = fs::metadata(&file_path).await.map_err(FileError::from)?;
    if meta.is_dir() {
        // Directory requests resolve to the configured welcome file
        file_path.push(&state.config.site.welcome_file);
        meta = fs::metadata(&file_path).await.map_err(FileError::from)?;
    }
    if !meta.is_file() {
        return Err(FileError::NotFound);
    }

    let modified = meta.modified().map_err(FileError::from)?;
    let etag = cache::resource_etag(&file_path, modified, meta.len());
    let cache_control = format!("public, max-age={}", state.config.site.cache_max_age);

    if cache::check_not_modified(
        ctx.if_none_match.as_deref(),
        ctx.if_modified_since.as_deref(),
        &etag,
        modified,
    ) {
        return Ok(http::build_304_response(&etag, &cache_control));
    }

    let content = fs::read(&file_path).await.map_err(FileError::from)?;
    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    let last_modified = cache::http_date(modified);
    let cache_headers = CacheHeaders {
        etag: &etag,
        last_modified: &last_modified,
        cache_control: &cache_control,
    };
    let total_size = content.len();

    // Range requests bypass compression; the offsets address the bytes
    // on disk, not an encoded representation.
    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(content[start..=end].to_vec())
            };
            return Ok(response::build_partial_response(
                body,
                content_type,
                &cache_headers,
                start,
                end,
                total_size,
                ctx.is_head,
            ));
        }
        RangeParseResult::NotSatisfiable => {
            return Ok(http::build_416_response(total_size));
        }
        RangeParseResult::None => {}
    }

    if should_compress(ctx, state, content_type, total_size) {
        match compress::gzip(&content) {
            Ok(encoded) => {
                return Ok(response::build_file_response(
                    Bytes::from(encoded),
                    content_type,
                    Some("gzip"),
                    &cache_headers,
                    ctx.is_head,
                ));
            }
            Err(e) => {
                // Fall through and serve the identity encoding
                logger::log_error(&format!("gzip failed for '{}': {e}", ctx.path));
            }
        }
    }

    Ok(response::build_file_response(
        Bytes::from(content),
        content_type,
        None,
        &cache_headers,
        ctx.is_head,
    ))
}

/// Compression eligibility: enabled, a full-representation body of at
/// least `min_length` bytes, allow-listed MIME type, and a client that
/// advertises gzip support. Applies to HEAD too, so its headers match
/// what the corresponding GET would send.
fn should_compress(
    ctx: &RequestContext<'_>,
    state: &ServerContext,
    content_type: &str,
    body_len: usize,
) -> bool {
    state.config.compression.enabled
        && body_len >= state.config.compression.min_length
        && compress::is_compressible(content_type, &state.compressible)
        && compress::accepts_gzip(ctx.accept_encoding.as_deref())
}
