//! Error types for capi-core.

use thiserror::Error;

/// Result type alias for capi-core operations.
pub type Result<T> = std::result::Result<T, CapiError>;

/// Errors that can occur while parsing and diffing header trees.
#[derive(Error, Debug)]
pub enum CapiError {
    /// The AST provider could not produce a tree for a header.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Header path relative to the scanned root.
        path: String,
        /// Description of the parse failure.
        message: String,
    },

    /// A documentation comment could not be split into tag blocks.
    #[error("Comment parse error: {message}")]
    CommentParse {
        /// Description of the malformed comment.
        message: String,
    },

    /// A diff root is missing or not a directory.
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// IO error reading header files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error for exported reports.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool could not be created.
    #[error("Thread pool error: {message}")]
    ThreadPool {
        /// Description of the pool failure.
        message: String,
    },
}
