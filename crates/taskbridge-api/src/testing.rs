//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::transport::{ApiResponse, ErrorPayload, Method, RequestOptions, Transport};

/// One request seen by [`CannedTransport`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub params: Value,
    pub options: RequestOptions,
}

/// Answers each path with a fixed response and records every request.
#[derive(Default)]
pub struct CannedTransport {
    routes: Mutex<HashMap<String, ApiResponse>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl CannedTransport {
    pub fn route(self, path: &str, response: ApiResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
        self
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.recorded().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.recorded.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            params,
            options,
        });
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                ApiResponse::failure(vec![ErrorPayload::new(format!("no route for {path}"))])
            }))
    }
}
