//! Request path resolution module
//!
//! Maps a request path onto the document root by pure lexical
//! normalization. Because `..` is resolved against the segment stack
//! before any filesystem access, a crafted path can never address a
//! file outside the root.

use std::path::{Path, PathBuf};

use crate::error::FileError;

/// Resolve a request path against the document root.
///
/// Empty and `.` segments are dropped, `..` pops the previous segment.
/// A `..` with nothing left to pop means the path would escape the
/// root and is rejected with [`FileError::Traversal`].
pub fn resolve_path(root: &Path, request_path: &str) -> Result<PathBuf, FileError> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FileError::Traversal);
                }
            }
            other => segments.push(other),
        }
    }

    let mut resolved = root.to_path_buf();
    for segment in segments {
        resolved.push(segment);
    }
    Ok(resolved)
}
