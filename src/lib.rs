//! filesrv - a TLS-terminating static file server
//!
//! Serves a document root over HTTP and, when certificate material is
//! configured, HTTPS. Conditional caching (`ETag`/`Last-Modified`),
//! gzip compression for textual types, byte-range requests, and
//! welcome-file resolution are built in; there is no routing layer and
//! no per-request state beyond the connection.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod tls;
