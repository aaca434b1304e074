//! Shared helpers for the CLI subcommands.

use std::path::Path;

use anyhow::{Context, Result, bail};
use taskbridge_api::{Options, OptionsStore};
use taskbridge_directory::User;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber, honouring `RUST_LOG` when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Load options from `path`, then layer `.env`, the process environment and
/// an explicit `--host` on top, in that order.
pub fn load_options(path: &Path, host: Option<&str>) -> Result<(OptionsStore, Options)> {
    if let Ok(env_path) = dotenvy::dotenv() {
        debug!(path = %env_path.display(), ".env loaded");
    }

    let store = OptionsStore::new(path);
    let mut options = store
        .load()
        .with_context(|| format!("failed to load options from {}", path.display()))?;
    options.apply_env();
    if let Some(host) = host {
        options.asana_host_port = host.to_string();
    }
    Ok((store, options))
}

/// Pick the workspace named on the command line, else the remembered one.
pub fn resolve_workspace(explicit: Option<String>, options: &Options) -> Result<String> {
    if let Some(workspace) = explicit {
        return Ok(workspace);
    }
    match options.preferred_workspace() {
        Some(workspace) => Ok(workspace.to_string()),
        None => bail!(
            "no workspace given and none remembered; pass one or set default_workspace_id"
        ),
    }
}

/// Persist `workspace_id` as the last one used.  Failures only warn.
///
/// Works on a fresh read of the file so that `--host` and environment
/// overrides (including the access token) never end up on disk.
pub fn remember_workspace(store: &OptionsStore, workspace_id: &str) {
    let mut saved = match store.load() {
        Ok(saved) => saved,
        Err(e) => {
            warn!(error = %e, path = %store.path().display(), "failed to remember workspace");
            return;
        }
    };
    if saved.last_used_workspace_id.as_deref() == Some(workspace_id) {
        return;
    }
    saved.last_used_workspace_id = Some(workspace_id.to_string());
    if let Err(e) = store.save(&saved) {
        warn!(error = %e, path = %store.path().display(), "failed to remember workspace");
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Print users one per line, or as a JSON array.
pub fn print_users(users: &[User], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(users)?);
        return Ok(());
    }
    if users.is_empty() {
        println!("  (no users)");
    }
    for user in users {
        println!("  {:<20} {}", user.id, user.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbridge_api::options::DEFAULT_HOST_PORT;

    #[test]
    fn explicit_workspace_wins() {
        let options = Options {
            default_workspace_id: Some("1".into()),
            ..Options::default()
        };
        assert_eq!(resolve_workspace(Some("9".into()), &options).unwrap(), "9");
        assert_eq!(resolve_workspace(None, &options).unwrap(), "1");
    }

    #[test]
    fn missing_workspace_is_an_error() {
        assert!(resolve_workspace(None, &Options::default()).is_err());
    }

    #[test]
    fn remembered_workspace_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = OptionsStore::new(dir.path().join("taskbridge.toml"));

        remember_workspace(&store, "42");

        assert_eq!(
            store.load().unwrap().last_used_workspace_id.as_deref(),
            Some("42")
        );
    }

    #[test]
    fn remembering_workspace_keeps_overrides_off_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = OptionsStore::new(dir.path().join("taskbridge.toml"));
        store
            .save(&Options {
                default_workspace_id: Some("1".into()),
                ..Options::default()
            })
            .unwrap();

        let mut options = store.load().unwrap();
        options.asana_host_port = "staging.example:9999".into();
        options.access_token = Some("secret".into());

        remember_workspace(&store, "42");

        let saved = store.load().unwrap();
        assert_ne!(saved.asana_host_port, options.asana_host_port);
        assert_eq!(saved.asana_host_port, DEFAULT_HOST_PORT);
        assert!(saved.access_token.is_none());
        assert_eq!(saved.default_workspace_id.as_deref(), Some("1"));
        assert_eq!(saved.last_used_workspace_id.as_deref(), Some("42"));
    }
}
