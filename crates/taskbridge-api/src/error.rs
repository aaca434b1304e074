//! API error types.
//!
//! Every fallible operation in this crate surfaces an [`ApiError`].  Remote
//! failures keep the full response so callers can inspect the server's
//! error payloads.  There is no cancellation variant: a superseded request
//! is dropped without reporting anything.

use crate::transport::ApiResponse;

/// Unified error type for the taskbridge API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// The request exceeded the transport's time limit.
    #[error("timeout after {seconds}s")]
    Timeout { seconds: u64 },

    /// The server answered with an `errors` payload.
    #[error("remote error: {}", summarize(.0))]
    Remote(ApiResponse),

    /// The response body or its `data` did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Options could not be loaded or saved.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The remote response, when this is a [`ApiError::Remote`].
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Remote(response) => Some(response),
            _ => None,
        }
    }
}

fn summarize(response: &ApiResponse) -> String {
    let messages: Vec<&str> = response
        .errors
        .iter()
        .flatten()
        .map(|e| e.message.as_str())
        .collect();
    if messages.is_empty() {
        "unspecified".to_string()
    } else {
        messages.join("; ")
    }
}

/// Convenience alias used throughout the API crate.
pub type Result<T> = std::result::Result<T, ApiError>;
