//! # taskbridge-api
//!
//! Client for the task-management API, built around a shared
//! [`UserDirectory`](taskbridge_directory::UserDirectory).
//!
//! - **[`transport`]** -- the [`Transport`] seam and the response envelope.
//! - **[`http`]** -- [`HttpTransport`]: reqwest-backed transport with a
//!   short-lived GET cache, plus the network [`HttpPhotoLoader`].
//! - **[`dispatch`]** -- [`ResponseDispatcher`]: one rule for telling
//!   success from failure, and a fallback sink for unhandled errors.
//! - **[`search`]** -- [`TypeAheadSearch`]: immediate local results plus
//!   one cancelable server refinement.
//! - **[`client`]** -- [`ApiClient`]: pass-through calls that feed the
//!   directory as they go.
//! - **[`priming`]** -- [`CachePrimer`]: keeps the transport cache warm.
//! - **[`options`]** -- [`Options`] and their on-disk [`OptionsStore`].

pub mod client;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod options;
pub mod priming;
pub mod search;
pub mod task;
pub mod transport;

#[cfg(test)]
mod testing;

// ── re-exports ───────────────────────────────────────────────────────

pub use client::ApiClient;
pub use dispatch::{ErrorCallback, ErrorSink, ResponseDispatcher};
pub use error::{ApiError, Result};
pub use http::{HttpPhotoLoader, HttpTransport};
pub use options::{Options, OptionsStore};
pub use priming::{CachePrimer, DEFAULT_PRIME_INTERVAL, MIN_PRIME_INTERVAL, prime_once};
pub use search::{TYPEAHEAD_COUNT, TypeAheadSearch};
pub use task::{NewTask, Task};
pub use transport::{ApiResponse, ErrorPayload, Method, RequestOptions, Transport};
