//! CLI error types.

use thiserror::Error;

/// Result type alias for shardctl operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration (cluster URL, credentials, flags).
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never completed: connection refused, timeout, broken body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The cluster answered with a non-success status.
    #[error("cluster returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
