//! User photo prefetching.
//!
//! Learning about a user with a photo warms whatever image cache sits
//! downstream (a browser, a proxy, a local HTTP cache).  The prefetcher only
//! guarantees that each URL is handed to the [`PhotoLoader`] at most once for
//! the lifetime of the process; what the loader does with it, and whether
//! that succeeds, is not observed.

use std::sync::Arc;

use dashmap::DashSet;

/// Starts loading an image.  Implementations must not block.
pub trait PhotoLoader: Send + Sync {
    /// Begin loading `url`.  The outcome is not reported back.
    fn load(&self, url: &str);
}

/// A loader that does nothing.  Used when no network is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPhotoLoader;

impl PhotoLoader for NoopPhotoLoader {
    fn load(&self, _url: &str) {}
}

/// Set of photo URLs already requested, plus the loader that requests them.
pub struct PhotoPrefetcher {
    requested: DashSet<String>,
    loader: Arc<dyn PhotoLoader>,
}

impl PhotoPrefetcher {
    pub fn new(loader: Arc<dyn PhotoLoader>) -> Self {
        Self {
            requested: DashSet::new(),
            loader,
        }
    }

    /// Request `url` unless it has been requested before.
    pub fn prefetch(&self, url: &str) {
        // `insert` is the check and the record in one step, so two racing
        // callers cannot both start a load.
        if !self.requested.insert(url.to_string()) {
            return;
        }
        tracing::debug!(url = %url, "prefetching user photo");
        self.loader.load(url);
    }

    /// Whether `url` has already been handed to the loader.
    pub fn contains(&self, url: &str) -> bool {
        self.requested.contains(url)
    }

    /// Number of distinct URLs requested so far.
    pub fn len(&self) -> usize {
        self.requested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }
}

impl Default for PhotoPrefetcher {
    fn default() -> Self {
        Self::new(Arc::new(NoopPhotoLoader))
    }
}

impl std::fmt::Debug for PhotoPrefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoPrefetcher")
            .field("requested", &self.requested.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
