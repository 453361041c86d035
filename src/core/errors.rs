//! Custom error types for synchronization operations

use thiserror::Error;

/// Errors raised while synchronizing locale trees
#[derive(Error, Debug)]
pub enum SyncError {
    /// A locale file could not be parsed into a translation tree
    #[error("cannot parse {path}: {message}")]
    InputFormat {
        /// Path of the offending file
        path: String,
        /// Parser diagnostic
        message: String,
    },

    /// The target file extension maps to no known serialization form
    #[error("unsupported output format: .{extension}")]
    OutputFormat {
        /// Extension of the target path, without the dot
        extension: String,
    },

    /// A module file violated the restricted object-literal grammar
    #[error("module literal syntax error at offset {offset}: {message}")]
    ModuleSyntax {
        /// Character offset into the extracted literal
        offset: usize,
        /// Grammar diagnostic
        message: String,
    },

    /// A tree root was not traversable as a key-value object
    #[error("malformed translation tree: {message}")]
    MalformedTree {
        /// What was found instead
        message: String,
    },

    /// Translation API returned a non-success status
    #[error("translation API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Request never reached the API
    #[error("network error: {message}")]
    Network {
        /// Transport diagnostic
        message: String,
    },

    /// API responded with a body we could not interpret
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// What was missing or malformed
        message: String,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Config {
        /// What is missing or out of range
        message: String,
    },

    /// File operation error
    #[error("file error: {path} - {message}")]
    File {
        /// Path of the file
        path: String,
        /// Underlying diagnostic
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;
