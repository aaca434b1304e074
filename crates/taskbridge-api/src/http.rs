//! reqwest-backed transport and photo loader.
//!
//! Features:
//!   - Bearer-token authentication (optional)
//!   - GET parameters as query pairs, POST/PUT parameters as `{"data": ...}`
//!   - In-memory response cache for GETs (15 min TTL, 1000 entries) via moka,
//!     bypassed on read by [`RequestOptions::miss_cache`]
//!   - Non-2xx answers normalized into an `errors` envelope
//!
//! There are no retries; a failed request is reported once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::{Value, json};
use taskbridge_directory::PhotoLoader;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::options::Options;
use crate::transport::{ApiResponse, ErrorPayload, Method, RequestOptions, Transport};

// ═══════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════

/// Path prefix of the REST API on the configured host.
const API_PATH: &str = "/api/1.0";

/// Request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Cache TTL in minutes.
const CACHE_TTL_MINUTES: u64 = 15;
/// Maximum cached responses.
const CACHE_MAX_ENTRIES: u64 = 1_000;

const USER_AGENT: &str = concat!("taskbridge/", env!("CARGO_PKG_VERSION"));

// ═══════════════════════════════════════════════════════════════════════
//  Transport
// ═══════════════════════════════════════════════════════════════════════

/// HTTP transport for the task-management REST API.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: url::Url,
    access_token: Option<String>,
    cache: Cache<String, ApiResponse>,
}

impl HttpTransport {
    /// Create a transport for `https://{asana_host_port}/api/1.0`.
    pub fn new(options: &Options) -> Result<Self> {
        let base_url = format!("https://{}{API_PATH}", options.asana_host_port);
        let mut transport = Self::with_base_url(&base_url)?;
        transport.access_token = options.access_token.clone();
        Ok(transport)
    }

    /// Create a transport against an explicit API root, e.g. a test server.
    ///
    /// Fails with [`ApiError::Config`] when `base_url` is not an absolute
    /// URL or the HTTP client cannot be initialized (e.g. no TLS backend).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let base_url = url::Url::parse(trimmed)
            .map_err(|e| ApiError::Config(format!("invalid API base url `{trimmed}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "API base url `{trimmed}` cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        let cache = Cache::builder()
            .max_capacity(CACHE_MAX_ENTRIES)
            .time_to_live(Duration::from_secs(CACHE_TTL_MINUTES * 60))
            .build();

        Ok(Self {
            client,
            base_url,
            access_token: None,
            cache,
        })
    }

    /// Authenticate every request with `token`.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// The API root requests are issued against.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// A clone of the underlying HTTP client, for the photo loader.
    pub fn client(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// Build the full URL for `path`, appending `params` as query pairs.
    ///
    /// `path` is appended to the base path as-is except that `?` and `#` are
    /// percent-encoded, so they can never start a query or fragment.  Ids
    /// that may contain `/` must be encoded by the caller, see
    /// [`api_path`](crate::transport::api_path).
    fn url_for(&self, path: &str, params: &Value) -> Result<url::Url> {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);

        if let Some(object) = params.as_object()
            && !object.is_empty()
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in object {
                pairs.append_pair(key, &query_value(value));
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: url::Url, params: Value) -> Result<ApiResponse> {
        let mut request = self.client.request(method.clone(), url.clone());
        if method != Method::GET {
            request = request.json(&json!({ "data": params }));
        }
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    seconds: DEFAULT_TIMEOUT_SECS,
                }
            } else {
                ApiError::Transport {
                    reason: format!("{method} {url} failed: {e}"),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            reason: format!("failed to read response body: {e}"),
        })?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        debug!(status = status.as_u16(), url = %url, "API request failed");
        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(envelope) if envelope.is_error() => Ok(envelope),
            _ => Ok(ApiResponse::failure(vec![ErrorPayload::new(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            ))])),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let is_read = method == Method::GET;
        let url = if is_read {
            self.url_for(path, &params)?
        } else {
            self.url_for(path, &Value::Null)?
        };
        let cache_key = url.to_string();

        if is_read
            && !options.miss_cache
            && let Some(cached) = self.cache.get(&cache_key).await
        {
            debug!(url = %cache_key, "returning cached API response");
            return Ok(cached);
        }

        debug!(method = %method, url = %cache_key, miss_cache = options.miss_cache, "API request");
        let response = self.send(method, url, params).await?;

        if is_read && !response.is_error() {
            self.cache.insert(cache_key, response.clone()).await;
        }
        Ok(response)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Render a JSON value as a query-string value.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Photo loader
// ═══════════════════════════════════════════════════════════════════════

/// Loads photos with a fire-and-forget GET on the current tokio runtime.
#[derive(Clone)]
pub struct HttpPhotoLoader {
    client: reqwest::Client,
}

impl HttpPhotoLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Share the transport's connection pool.
    pub fn from_transport(transport: &HttpTransport) -> Arc<Self> {
        Arc::new(Self::new(transport.client()))
    }
}

impl PhotoLoader for HttpPhotoLoader {
    fn load(&self, url: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(url = %url, "no tokio runtime, skipping photo prefetch");
            return;
        };

        let client = self.client.clone();
        let url = url.to_string();
        runtime.spawn(async move {
            match client.get(&url).send().await {
                Ok(response) => {
                    // Draining the body is what actually fills downstream caches.
                    let status = response.status();
                    let _ = response.bytes().await;
                    debug!(url = %url, status = status.as_u16(), "photo prefetched");
                }
                Err(e) => debug!(url = %url, error = %e, "photo prefetch failed"),
            }
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
