//! Per-workspace user directory.
//!
//! The directory is an in-memory cache of every user the process has seen
//! in a successful API response, bucketed by workspace.  It is filled
//! opportunistically (listing users, fetching the current user, type-ahead
//! results) and never evicts: a single account's organization membership
//! is bounded, and the cache is rebuilt from scratch on restart.
//!
//! Internally the outer map is a [`DashMap`] so buckets for different
//! workspaces can be written concurrently; each bucket is a [`BTreeMap`]
//! keyed by user id, which gives snapshots a stable order (ascending id).
//!
//! # Example
//!
//! ```rust
//! # use taskbridge_directory::{QueryPattern, User, UserDirectory};
//! let directory = UserDirectory::default();
//! directory.upsert("ws1", User::new("1", "Ann"));
//! directory.upsert("ws1", User::new("2", "Bob"));
//!
//! let hits = directory.filter("ws1", &QueryPattern::build("an"));
//! assert_eq!(hits, vec![User::new("1", "Ann")]);
//! assert!(directory.snapshot("unknown").is_empty());
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;

use crate::model::{User, Workspace};
use crate::pattern::QueryPattern;
use crate::photo::PhotoPrefetcher;

/// Concurrent, process-wide user cache.
pub struct UserDirectory {
    buckets: DashMap<String, BTreeMap<String, User>>,
    workspaces: RwLock<Vec<Workspace>>,
    photos: Arc<PhotoPrefetcher>,
}

impl UserDirectory {
    /// Create an empty directory that prefetches photos through `photos`.
    pub fn new(photos: Arc<PhotoPrefetcher>) -> Self {
        Self {
            buckets: DashMap::new(),
            workspaces: RwLock::new(Vec::new()),
            photos,
        }
    }

    /// Insert or overwrite `user` under `workspace_id`.
    ///
    /// Creates the workspace bucket on first use and kicks off a photo
    /// prefetch when the user has a photo.
    pub fn upsert(&self, workspace_id: &str, user: User) {
        let photo = user.photo.clone();
        let user_id = user.id.clone();

        let replaced = self
            .buckets
            .entry(workspace_id.to_string())
            .or_default()
            .insert(user_id.clone(), user)
            .is_some();

        tracing::trace!(
            workspace_id = %workspace_id,
            user_id = %user_id,
            replaced,
            "user upserted"
        );

        if let Some(url) = photo {
            self.photos.prefetch(&url);
        }
    }

    /// Upsert every user in `users`, in order.
    pub fn upsert_all(&self, workspace_id: &str, users: impl IntoIterator<Item = User>) {
        for user in users {
            self.upsert(workspace_id, user);
        }
    }

    /// Every known user in `workspace_id`, ordered by id.
    ///
    /// An unknown workspace yields an empty list.
    pub fn snapshot(&self, workspace_id: &str) -> Vec<User> {
        self.buckets
            .get(workspace_id)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Users in `workspace_id` whose display name satisfies `pattern`.
    pub fn filter(&self, workspace_id: &str, pattern: &QueryPattern) -> Vec<User> {
        self.buckets
            .get(workspace_id)
            .map(|bucket| {
                bucket
                    .values()
                    .filter(|user| pattern.matches(&user.name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up a single user.
    pub fn get(&self, workspace_id: &str, user_id: &str) -> Option<User> {
        self.buckets
            .get(workspace_id)
            .and_then(|bucket| bucket.get(user_id).cloned())
    }

    /// Number of users known in `workspace_id`.
    pub fn user_count(&self, workspace_id: &str) -> usize {
        self.buckets
            .get(workspace_id)
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }

    /// Ids of every workspace with a bucket, sorted.
    pub fn workspace_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.buckets.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Remember the workspace list last returned by the server.
    ///
    /// Every listed workspace gets a (possibly empty) bucket so later reads
    /// can tell "known but no users yet" from "never heard of it" via
    /// [`UserDirectory::workspace_ids`].
    pub fn record_workspaces(&self, workspaces: Vec<Workspace>) {
        for workspace in &workspaces {
            self.buckets.entry(workspace.id.clone()).or_default();
        }
        tracing::debug!(count = workspaces.len(), "workspace list recorded");
        *self
            .workspaces
            .write()
            .unwrap_or_else(PoisonError::into_inner) = workspaces;
    }

    /// The workspace list last recorded, in server order.
    pub fn workspaces(&self) -> Vec<Workspace> {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The photo prefetcher fed by this directory.
    pub fn photos(&self) -> &PhotoPrefetcher {
        &self.photos
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new(Arc::new(PhotoPrefetcher::default()))
    }
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("workspaces", &self.buckets.len())
            .field("photos", &self.photos)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::PhotoLoader;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl PhotoLoader for CountingLoader {
        fn load(&self, _url: &str) {
            self.loads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn directory_with_counter() -> (UserDirectory, Arc<CountingLoader>) {
        let loader = Arc::new(CountingLoader::default());
        let photos = Arc::new(PhotoPrefetcher::new(loader.clone()));
        (UserDirectory::new(photos), loader)
    }

    #[test]
    fn upsert_creates_bucket() {
        let directory = UserDirectory::default();
        directory.upsert("ws1", User::new("1", "Ann"));

        assert_eq!(directory.snapshot("ws1"), vec![User::new("1", "Ann")]);
        assert_eq!(directory.workspace_ids(), vec!["ws1".to_string()]);
    }

    #[test]
    fn upsert_overwrites_same_id() {
        let directory = UserDirectory::default();
        directory.upsert("ws1", User::new("1", "Ann"));
        directory.upsert("ws1", User::new("1", "Ann Lee"));

        assert_eq!(directory.snapshot("ws1"), vec![User::new("1", "Ann Lee")]);
    }

    #[test]
    fn upsert_is_idempotent() {
        let (directory, loader) = directory_with_counter();
        let ann = User::new("1", "Ann").with_photo("https://img/ann.png");

        directory.upsert("ws1", ann.clone());
        let first = directory.snapshot("ws1");
        directory.upsert("ws1", ann);
        let second = directory.snapshot("ws1");

        assert_eq!(first, second);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn workspaces_are_isolated() {
        let directory = UserDirectory::default();
        directory.upsert("ws1", User::new("1", "Ann"));
        directory.upsert("ws2", User::new("2", "Bob"));

        assert_eq!(directory.user_count("ws1"), 1);
        assert_eq!(directory.user_count("ws2"), 1);
        assert!(directory.get("ws1", "2").is_none());
        assert_eq!(directory.get("ws2", "2"), Some(User::new("2", "Bob")));
    }

    #[test]
    fn unknown_workspace_reads_empty() {
        let directory = UserDirectory::default();
        assert!(directory.snapshot("nope").is_empty());
        assert!(directory.filter("nope", &QueryPattern::Any).is_empty());
        assert_eq!(directory.user_count("nope"), 0);
    }

    #[test]
    fn snapshot_order_is_stable() {
        let directory = UserDirectory::default();
        directory.upsert("ws1", User::new("3", "Cy"));
        directory.upsert("ws1", User::new("1", "Ann"));
        directory.upsert("ws1", User::new("2", "Bob"));

        let ids: Vec<String> = directory.snapshot("ws1").into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(directory.snapshot("ws1"), directory.snapshot("ws1"));
    }

    #[test]
    fn filter_with_any_skips_blank_names() {
        let directory = UserDirectory::default();
        directory.upsert("ws1", User::new("1", "Ann"));
        directory.upsert("ws1", User::new("2", "  "));

        let hits = directory.filter("ws1", &QueryPattern::build(""));
        assert_eq!(hits, vec![User::new("1", "Ann")]);
    }

    #[test]
    fn filter_applies_pattern() {
        let directory = UserDirectory::default();
        directory.upsert("ws1", User::new("1", "John Smith"));
        directory.upsert("ws1", User::new("2", "Smith John"));
        directory.upsert("ws1", User::new("3", "Jonathan Smithson"));

        let ids: Vec<String> = directory
            .filter("ws1", &QueryPattern::build("jo sm"))
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn users_without_photo_do_not_prefetch() {
        let (directory, loader) = directory_with_counter();
        directory.upsert("ws1", User::new("1", "Ann"));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
        assert!(directory.photos().is_empty());
    }

    #[test]
    fn record_workspaces_creates_empty_buckets() {
        let directory = UserDirectory::default();
        directory.record_workspaces(vec![
            Workspace::new("20", "Side"),
            Workspace::new("10", "Acme"),
        ]);

        assert_eq!(directory.workspace_ids(), vec!["10", "20"]);
        assert_eq!(directory.user_count("10"), 0);
        assert_eq!(
            directory.workspaces(),
            vec![Workspace::new("20", "Side"), Workspace::new("10", "Acme")]
        );
    }
}
