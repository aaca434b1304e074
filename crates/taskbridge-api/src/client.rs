//! Pass-through API calls.
//!
//! [`ApiClient`] is the single entry point the rest of an application talks
//! to.  Most calls are thin: build a path, ask the [`Transport`], run the
//! answer through [`ResponseDispatcher::classify`].  The ones whose answers
//! carry user data also feed the shared [`UserDirectory`], so the type-ahead
//! cache fills up as a side effect of ordinary use.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use taskbridge_directory::{CurrentUser, PhotoPrefetcher, User, UserDirectory, Workspace};
use tracing::{debug, info};

use crate::dispatch::ResponseDispatcher;
use crate::error::Result;
use crate::http::{HttpPhotoLoader, HttpTransport};
use crate::options::Options;
use crate::search::TypeAheadSearch;
use crate::task::{NewTask, Task};
use crate::transport::{Method, RequestOptions, Transport, api_path};

/// Fields requested whenever a user record is fetched.
const USER_FIELDS: &str = "name,photo.image_60x60";

/// Fields requested for the current user.
const CURRENT_USER_FIELDS: &str = "name,photo.image_60x60,workspaces.name";

/// Client for the task-management API.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    directory: Arc<UserDirectory>,
    search: TypeAheadSearch,
    host_port: String,
}

impl ApiClient {
    /// Assemble a client from its parts.
    pub fn new(
        transport: Arc<dyn Transport>,
        directory: Arc<UserDirectory>,
        dispatcher: ResponseDispatcher,
        options: &Options,
    ) -> Self {
        let search = TypeAheadSearch::new(
            Arc::clone(&transport),
            Arc::clone(&directory),
            dispatcher,
        );
        Self {
            transport,
            directory,
            search,
            host_port: options.asana_host_port.clone(),
        }
    }

    /// Build the standard HTTP stack: reqwest transport, network photo
    /// prefetch, and a logging fallback for unhandled errors.
    pub fn connect(options: &Options) -> Result<Self> {
        let transport = HttpTransport::new(options)?;
        let photos = Arc::new(PhotoPrefetcher::new(HttpPhotoLoader::from_transport(
            &transport,
        )));
        let directory = Arc::new(UserDirectory::new(photos));
        info!(host = %options.asana_host_port, "API client ready");
        Ok(Self::new(
            Arc::new(transport),
            directory,
            ResponseDispatcher::logging(),
            options,
        ))
    }

    // -----------------------------------------------------------------------
    // Users and workspaces
    // -----------------------------------------------------------------------

    /// Fetch the authenticated user and file them under each of their
    /// workspaces.
    pub async fn current_user(&self, options: RequestOptions) -> Result<CurrentUser> {
        let me: CurrentUser = self
            .get("/users/me", json!({ "opt_fields": CURRENT_USER_FIELDS }), options)
            .await?;
        for workspace in &me.workspaces {
            self.directory.upsert(&workspace.id, me.user.clone());
        }
        debug!(user_id = %me.user.id, workspaces = me.workspaces.len(), "current user fetched");
        Ok(me)
    }

    /// List the workspaces visible to the authenticated user.
    pub async fn workspaces(&self, options: RequestOptions) -> Result<Vec<Workspace>> {
        let workspaces: Vec<Workspace> = self.get("/workspaces", json!({}), options).await?;
        self.directory.record_workspaces(workspaces.clone());
        Ok(workspaces)
    }

    /// List every user of `workspace_id`.
    pub async fn users(&self, workspace_id: &str, options: RequestOptions) -> Result<Vec<User>> {
        let users: Vec<User> = self
            .get(
                &api_path(&["workspaces", workspace_id, "users"]),
                json!({ "opt_fields": USER_FIELDS }),
                options,
            )
            .await?;
        self.directory
            .upsert_all(workspace_id, users.iter().cloned());
        debug!(workspace_id = %workspace_id, count = users.len(), "workspace users fetched");
        Ok(users)
    }

    /// Fetch one user, filing them under `workspace_id`.
    pub async fn user(
        &self,
        workspace_id: &str,
        user_id: &str,
        options: RequestOptions,
    ) -> Result<User> {
        let user: User = self
            .get(
                &api_path(&["users", user_id]),
                json!({ "opt_fields": USER_FIELDS }),
                options,
            )
            .await?;
        self.directory.upsert(workspace_id, user.clone());
        Ok(user)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Create a task in `workspace_id`.
    pub async fn create_task(&self, workspace_id: &str, task: &NewTask) -> Result<Task> {
        let params = serde_json::to_value(task)?;
        let response = self
            .transport
            .request(
                Method::POST,
                &api_path(&["workspaces", workspace_id, "tasks"]),
                params,
                RequestOptions::default(),
            )
            .await;
        let created: Task = ResponseDispatcher::classify(response)?;
        info!(workspace_id = %workspace_id, task_id = %created.id, "task created");
        Ok(created)
    }

    /// Deep link to a task in the web app.
    pub fn task_view_url(&self, workspace_id: &str, task_id: &str) -> String {
        format!(
            "https://{}/0{}",
            self.host_port,
            api_path(&[workspace_id, task_id])
        )
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The type-ahead search sharing this client's transport and directory.
    pub fn search(&self) -> &TypeAheadSearch {
        &self.search
    }

    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Value,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self
            .transport
            .request(Method::GET, path, params, options)
            .await;
        ResponseDispatcher::classify(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("host_port", &self.host_port)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
