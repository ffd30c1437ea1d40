/// Unified error types for the Fedi3 follow client
use thiserror::Error;

/// Main error type for the client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failures (connect, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response from a remote endpoint
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    /// Malformed or unexpected response body
    #[error("Decode error: {0}")]
    Decode(String),

    /// Actor or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Build a transport error from a reqwest failure, keeping the URL for context
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Transport(format!("request to {} timed out", url))
        } else {
            ClientError::Transport(format!("request to {} failed: {}", url, err))
        }
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;
