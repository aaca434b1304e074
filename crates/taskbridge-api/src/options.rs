//! Persisted client options.
//!
//! Options are a small TOML document on disk.  A missing file is not an
//! error: every field has a default, so a fresh install works against the
//! public host without any setup.  Two environment variables override the
//! file for the values most often changed per shell.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, Result};

/// Default API host.
pub const DEFAULT_HOST_PORT: &str = "app.asana.com";

/// Default interval between cache-priming passes (15 minutes).
pub const DEFAULT_PRIME_INTERVAL_SECS: u64 = 15 * 60;

/// Environment variable overriding [`Options::asana_host_port`].
pub const ENV_HOST: &str = "TASKBRIDGE_HOST";

/// Environment variable overriding [`Options::access_token`].
pub const ENV_ACCESS_TOKEN: &str = "TASKBRIDGE_ACCESS_TOKEN";

/// User-editable client options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Host (and optional port) serving the API and the web app.
    pub asana_host_port: String,
    /// Workspace preselected when none is given.
    pub default_workspace_id: Option<String>,
    /// Workspace used most recently, remembered across runs.
    pub last_used_workspace_id: Option<String>,
    /// Personal access token sent as a bearer credential.
    pub access_token: Option<String>,
    /// Seconds between background cache-priming passes.
    pub prime_interval_secs: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            asana_host_port: DEFAULT_HOST_PORT.to_string(),
            default_workspace_id: None,
            last_used_workspace_id: None,
            access_token: None,
            prime_interval_secs: DEFAULT_PRIME_INTERVAL_SECS,
        }
    }
}

impl Options {
    /// Apply `TASKBRIDGE_HOST` / `TASKBRIDGE_ACCESS_TOKEN` from the process
    /// environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_HOST).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, host: Option<String>, token: Option<String>) {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            debug!(host = %host, "host overridden from environment");
            self.asana_host_port = host.trim().to_string();
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token.trim().to_string());
        }
    }

    /// The workspace to use when the caller names none: last used, then
    /// the configured default.
    pub fn preferred_workspace(&self) -> Option<&str> {
        self.last_used_workspace_id
            .as_deref()
            .or(self.default_workspace_id.as_deref())
    }
}

/// Loads and saves [`Options`] at a fixed path.
#[derive(Debug, Clone)]
pub struct OptionsStore {
    path: PathBuf,
}

impl OptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read options from disk, or defaults when the file does not exist.
    pub fn load(&self) -> Result<Options> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "options file missing, using defaults");
            return Ok(Options::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let options = toml::from_str(&content).map_err(|e| {
            ApiError::Config(format!(
                "failed to parse options file {}: {e}",
                self.path.display()
            ))
        })?;
        info!(path = %self.path.display(), "options loaded");
        Ok(options)
    }

    /// Write `options` to disk, creating parent directories as needed.
    pub fn save(&self, options: &Options) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(options)
            .map_err(|e| ApiError::Config(format!("failed to serialize options: {e}")))?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "options saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
