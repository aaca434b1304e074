//! Uniform success/error routing for API responses.
//!
//! Every call that reaches the transport ends up here, so there is exactly
//! one rule for what counts as a failure:
//!
//! 1. the transport produced no envelope → its error,
//! 2. the envelope carries `errors` → [`ApiError::Remote`] with the whole
//!    response,
//! 3. otherwise `data` is decoded into the caller's type.
//!
//! [`ResponseDispatcher::classify`] applies the rule and returns a
//! `Result`, which is what the async pass-through calls use.
//! [`ResponseDispatcher::dispatch`] applies the same rule and routes into
//! callbacks, falling back to a sink fixed at construction when the caller
//! supplies no error callback.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::transport::ApiResponse;

/// Process-wide fallback for errors nobody asked to handle.
pub type ErrorSink = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// A caller-supplied, one-shot error callback.
pub type ErrorCallback = Box<dyn FnOnce(ApiError) + Send>;

/// Routes responses to success or error handlers.
#[derive(Clone)]
pub struct ResponseDispatcher {
    fallback: ErrorSink,
}

impl ResponseDispatcher {
    /// Create a dispatcher with a custom fallback sink.
    pub fn new(fallback: ErrorSink) -> Self {
        Self { fallback }
    }

    /// A dispatcher whose fallback logs the error and moves on.
    pub fn logging() -> Self {
        Self::new(Arc::new(|err: &ApiError| {
            tracing::warn!(error = %err, "unhandled API error");
        }))
    }

    /// Apply the success/error rule to a transport result.
    pub fn classify<T: DeserializeOwned>(response: Result<ApiResponse>) -> Result<T> {
        let response = response?;
        if response.is_error() {
            return Err(ApiError::Remote(response));
        }
        let data = response.data.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Classify `response` and invoke `on_success` with the decoded data,
    /// or the error path with the failure.
    pub fn dispatch<T, S>(
        &self,
        response: Result<ApiResponse>,
        on_success: S,
        on_error: Option<ErrorCallback>,
    ) where
        T: DeserializeOwned,
        S: FnOnce(T),
    {
        match Self::classify(response) {
            Ok(data) => on_success(data),
            Err(err) => self.fail(err, on_error),
        }
    }

    /// Deliver `err` to `on_error`, or to the fallback sink if there is none.
    pub fn fail(&self, err: ApiError, on_error: Option<ErrorCallback>) {
        match on_error {
            Some(callback) => callback(err),
            None => (self.fallback)(&err),
        }
    }
}

impl Default for ResponseDispatcher {
    fn default() -> Self {
        Self::logging()
    }
}

impl std::fmt::Debug for ResponseDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDispatcher").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
