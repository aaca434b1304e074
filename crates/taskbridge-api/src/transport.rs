//! The transport seam.
//!
//! Everything that talks to the remote API does so through [`Transport`].
//! A transport issues one authenticated request and hands back the parsed
//! `{ data?, errors? }` envelope; it does not interpret `errors`.  Routing
//! success and failure is the [`crate::dispatch`] module's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use reqwest::Method;

/// One error entry of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Optional machine-friendly phrase attached by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phrase: None,
        }
    }
}

/// The envelope every API response arrives in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorPayload>>,
}

impl ApiResponse {
    /// A successful envelope carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// A failed envelope carrying `errors`.
    pub fn failure(errors: Vec<ErrorPayload>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    /// Whether the envelope carries an `errors` indicator.
    ///
    /// Presence is what counts, even an empty list marks a failure.
    pub fn is_error(&self) -> bool {
        self.errors.is_some()
    }
}

/// Per-request options understood by every transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Skip any response cache and force a fresh remote fetch.
    pub miss_cache: bool,
}

impl RequestOptions {
    /// Options that bypass the response cache.
    pub fn fresh() -> Self {
        Self { miss_cache: true }
    }
}

/// Join raw `segments` into an API path, percent-encoding each one.
///
/// Ids come from the server and from users; encoding keeps a `/`, `?` or
/// `#` inside one from addressing a different resource.
///
/// ```rust
/// # use taskbridge_api::transport::api_path;
/// assert_eq!(api_path(&["workspaces", "ws 1", "users"]), "/workspaces/ws%201/users");
/// ```
pub fn api_path(segments: &[&str]) -> String {
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        // `byte_serialize` follows form encoding, where space is `+`; a
        // literal `+` has already been escaped to `%2B`.
        for chunk in url::form_urlencoded::byte_serialize(segment.as_bytes()) {
            path.push_str(if chunk == "+" { "%20" } else { chunk });
        }
    }
    path
}

/// Issues requests against the remote API.
///
/// `params` is a JSON object: query parameters for reads, the request body
/// for writes.  An `Err` means no envelope was obtained at all; a server
/// answer with `errors` is still `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<ApiResponse>;
}
