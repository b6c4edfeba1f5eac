//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the static file responder:
//! cache validation, MIME detection, range parsing, compression, and
//! response builders. Nothing in here touches the filesystem.

pub mod cache;
pub mod compress;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_416_response, build_500_response, build_options_response,
};
