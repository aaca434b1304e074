//! Incremental, cancelable type-ahead search over the user directory.
//!
//! A call to [`TypeAheadSearch::search`] does two things:
//!
//! 1. synchronously filters the [`UserDirectory`] with a [`QueryPattern`]
//!    built from the query and returns that (possibly stale) view, and
//! 2. spawns a refinement request asking the server for its best matches,
//!    always bypassing the response cache.  When it answers, the users are
//!    merged into the directory and handed to the caller's callback in the
//!    server's ranking order.
//!
//! At most one refinement is outstanding at a time.  Starting a search
//! aborts the previous refinement first; a superseded refinement never
//! invokes either callback, even if its response was already on the way.
//!
//! ```text
//!  search("a")  ──► filter ──► return [..]      spawn #1 ─┐
//!  search("ab") ──► abort #1, filter, return    spawn #2 ─┼─► server
//!                                        #2 answers ◄─────┘
//!                                        upsert, on_success(server users)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use taskbridge_directory::{QueryPattern, User, UserDirectory};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatch::{ErrorCallback, ResponseDispatcher};
use crate::error::ApiError;
use crate::transport::{Method, RequestOptions, Transport, api_path};

/// Maximum number of users the server is asked for per refinement.
pub const TYPEAHEAD_COUNT: u32 = 10;

/// Fields requested for each type-ahead user.
const TYPEAHEAD_FIELDS: &str = "name,photo.image_60x60";

/// The refinement currently in flight.
struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    next_generation: u64,
    pending: Option<Pending>,
}

/// Type-ahead search with last-writer-wins refinement.
pub struct TypeAheadSearch {
    transport: Arc<dyn Transport>,
    directory: Arc<UserDirectory>,
    dispatcher: ResponseDispatcher,
    slot: Arc<Mutex<Slot>>,
}

impl TypeAheadSearch {
    pub fn new(
        transport: Arc<dyn Transport>,
        directory: Arc<UserDirectory>,
        dispatcher: ResponseDispatcher,
    ) -> Self {
        Self {
            transport,
            directory,
            dispatcher,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Search `workspace_id` for users matching `query`.
    ///
    /// Returns the directory's current matches immediately.  The server's
    /// matches arrive later through `on_success`; failures go to `on_error`,
    /// or to the dispatcher's fallback sink when `on_error` is `None`.
    ///
    /// The refinement runs on the current tokio runtime.  Without one, the
    /// immediate result is still returned and the failure is reported
    /// through the error path.
    pub fn search<S>(
        &self,
        workspace_id: &str,
        query: &str,
        on_success: S,
        on_error: Option<ErrorCallback>,
    ) -> Vec<User>
    where
        S: FnOnce(Vec<User>) + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.pending.take() {
            previous.handle.abort();
            debug!(
                generation = previous.generation,
                "superseded type-ahead request aborted"
            );
        }

        let pattern = QueryPattern::build(query);
        let immediate = self.directory.filter(workspace_id, &pattern);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            drop(slot);
            warn!(workspace_id = %workspace_id, "no tokio runtime, type-ahead refinement skipped");
            self.dispatcher.fail(
                ApiError::Transport {
                    reason: "no async runtime available for type-ahead refinement".into(),
                },
                on_error,
            );
            return immediate;
        };

        slot.next_generation += 1;
        let generation = slot.next_generation;
        let refinement = Refinement {
            generation,
            workspace_id: workspace_id.to_string(),
            query: query.to_string(),
            transport: Arc::clone(&self.transport),
            directory: Arc::clone(&self.directory),
            dispatcher: self.dispatcher.clone(),
            slot: Arc::clone(&self.slot),
        };

        debug!(
            workspace_id = %workspace_id,
            generation,
            cached = immediate.len(),
            "type-ahead search issued"
        );

        // The slot stays locked until the handle is stored, so the task
        // cannot finish and look for itself before it is registered.
        let handle = runtime.spawn(refinement.run(on_success, on_error));
        slot.pending = Some(Pending { generation, handle });

        immediate
    }

    /// Abort the outstanding refinement, if any.  No callback fires.
    pub fn cancel(&self) {
        if let Some(previous) = lock(&self.slot).pending.take() {
            previous.handle.abort();
            debug!(generation = previous.generation, "type-ahead request cancelled");
        }
    }

    /// Whether a refinement is still outstanding.
    pub fn has_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    /// The directory this search reads from and feeds.
    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }
}

impl Drop for TypeAheadSearch {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TypeAheadSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeAheadSearch")
            .field("pending", &self.has_pending())
            .finish_non_exhaustive()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a spawned refinement needs, owned.
struct Refinement {
    generation: u64,
    workspace_id: String,
    query: String,
    transport: Arc<dyn Transport>,
    directory: Arc<UserDirectory>,
    dispatcher: ResponseDispatcher,
    slot: Arc<Mutex<Slot>>,
}

impl Refinement {
    async fn run<S>(self, on_success: S, on_error: Option<ErrorCallback>)
    where
        S: FnOnce(Vec<User>) + Send + 'static,
    {
        let path = api_path(&["workspaces", self.workspace_id.as_str(), "typeahead"]);
        let params = json!({
            "type": "user",
            "query": self.query,
            "count": TYPEAHEAD_COUNT,
            "opt_fields": TYPEAHEAD_FIELDS,
        });

        let response = self
            .transport
            .request(Method::GET, &path, params, RequestOptions::fresh())
            .await;

        if !self.claim() {
            debug!(generation = self.generation, "stale type-ahead response dropped");
            return;
        }

        let directory = Arc::clone(&self.directory);
        let workspace_id = self.workspace_id.clone();
        self.dispatcher.dispatch(
            response,
            move |users: Vec<User>| {
                debug!(
                    workspace_id = %workspace_id,
                    matches = users.len(),
                    "type-ahead response merged"
                );
                directory.upsert_all(&workspace_id, users.iter().cloned());
                on_success(users);
            },
            on_error,
        );
    }

    /// Clear the pending slot if this refinement is still the current one.
    ///
    /// Returns `false` when a newer search has taken over, in which case the
    /// response must be dropped.
    fn claim(&self) -> bool {
        let mut slot = lock(&self.slot);
        match &slot.pending {
            Some(pending) if pending.generation == self.generation => {
                slot.pending = None;
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
