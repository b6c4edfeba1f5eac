//! Error types
//!
//! Startup failures are fatal to the whole process; certificate failures
//! are fatal to the HTTPS listener only; file-resolution failures are
//! scoped to a single request and map onto HTTP status codes.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal startup failure. The process exits non-zero before any
/// listener starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid listen address '{0}': {1}")]
    Address(String, std::net::AddrParseError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize logging: {0}")]
    Logging(#[source] std::io::Error),

    #[error("runtime error: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Certificate material could not be loaded or was rejected.
///
/// Non-fatal overall: the server logs the failure, skips the HTTPS
/// listener and keeps serving plain HTTP.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("tls.cert_path and tls.key_path must both be set")]
    MissingPaths,

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in '{0}'")]
    NoCertificates(PathBuf),

    #[error("no usable private key found in '{0}'")]
    NoPrivateKey(PathBuf),

    #[error("certificate/key pair rejected: {0}")]
    Rejected(#[from] rustls::Error),
}

/// Per-request file resolution failure.
#[derive(Debug, Error)]
pub enum FileError {
    /// Request path would escape the document root after normalization.
    #[error("path escapes document root")]
    Traversal,

    #[error("file not found")]
    NotFound,

    #[error("permission denied")]
    Forbidden,

    #[error("i/o error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for FileError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::Forbidden,
            _ => Self::Io(err),
        }
    }
}

impl FileError {
    /// HTTP status code this failure maps to.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Traversal | Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Io(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(FileError::from(not_found), FileError::NotFound));

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert!(matches!(FileError::from(denied), FileError::Forbidden));

        let other = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert!(matches!(FileError::from(other), FileError::Io(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FileError::Traversal.status(), 403);
        assert_eq!(FileError::Forbidden.status(), 403);
        assert_eq!(FileError::NotFound.status(), 404);
        let io = FileError::Io(std::io::Error::other("disk"));
        assert_eq!(io.status(), 500);
    }
}
