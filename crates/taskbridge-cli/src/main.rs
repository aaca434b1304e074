//! CLI entry point for taskbridge.
//!
//! This binary provides the `taskbridge` command: a thin front end over
//! [`ApiClient`] for inspecting users and workspaces, trying the type-ahead
//! search, creating tasks, and keeping the response cache primed.

mod helpers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use taskbridge_api::{
    ApiClient, ApiError, CachePrimer, ErrorCallback, NewTask, Options, OptionsStore,
    RequestOptions,
};
use taskbridge_directory::User;
use tokio::sync::oneshot;
use tracing::info;

use crate::helpers::{
    init_tracing, load_options, print_users, remember_workspace, resolve_workspace,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// taskbridge: users, type-ahead search, and tasks from the terminal.
#[derive(Parser, Debug)]
#[command(name = "taskbridge", version, about = "Task-management API client")]
struct Cli {
    /// Options file.
    #[arg(long, global = true, default_value = "taskbridge.toml")]
    config: PathBuf,

    /// Override the API host (and port).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the authenticated user and their workspaces.
    Me,

    /// List visible workspaces.
    Workspaces,

    /// List the users of a workspace.
    Users {
        /// Workspace id (defaults to the last used one).
        workspace: Option<String>,
    },

    /// Type-ahead search for users.
    Search {
        workspace: String,
        query: String,
        /// Load the workspace's users first so the cached view is populated.
        #[arg(long)]
        warm: bool,
    },

    /// Create a task and print its URL.
    CreateTask {
        #[arg(long)]
        workspace: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        notes: Option<String>,
        /// User id of the assignee.
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Keep the response cache primed until Ctrl-C.
    Prime {
        /// Seconds between passes (defaults to the configured interval).
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("info");

    let (store, options) = load_options(&cli.config, cli.host.as_deref())?;
    let client = ApiClient::connect(&options).context("failed to set up API client")?;

    match cli.command {
        Commands::Me => cmd_me(&client, cli.json).await,
        Commands::Workspaces => cmd_workspaces(&client, cli.json).await,
        Commands::Users { workspace } => {
            let workspace = resolve_workspace(workspace, &options)?;
            cmd_users(&client, &workspace, cli.json).await?;
            remember_workspace(&store, &workspace);
            Ok(())
        }
        Commands::Search {
            workspace,
            query,
            warm,
        } => {
            cmd_search(&client, &workspace, &query, warm, cli.json).await?;
            remember_workspace(&store, &workspace);
            Ok(())
        }
        Commands::CreateTask {
            workspace,
            name,
            notes,
            assignee,
        } => {
            let workspace = resolve_workspace(workspace, &options)?;
            let task = NewTask {
                name,
                notes,
                assignee,
            };
            cmd_create_task(&client, &workspace, &task).await?;
            remember_workspace(&store, &workspace);
            Ok(())
        }
        Commands::Prime { interval_secs } => {
            cmd_prime(client, &store, &options, interval_secs).await
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn cmd_me(client: &ApiClient, json: bool) -> Result<()> {
    let me = client
        .current_user(RequestOptions::default())
        .await
        .context("failed to fetch current user")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user": me.user,
                "workspaces": me.workspaces,
            }))?
        );
        return Ok(());
    }

    println!("  {} ({})", me.user.name, me.user.id);
    for workspace in &me.workspaces {
        println!("    workspace {:<16} {}", workspace.id, workspace.name);
    }
    Ok(())
}

async fn cmd_workspaces(client: &ApiClient, json: bool) -> Result<()> {
    let workspaces = client
        .workspaces(RequestOptions::default())
        .await
        .context("failed to list workspaces")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }
    for workspace in &workspaces {
        println!("  {:<20} {}", workspace.id, workspace.name);
    }
    Ok(())
}

async fn cmd_users(client: &ApiClient, workspace: &str, json: bool) -> Result<()> {
    let users = client
        .users(workspace, RequestOptions::default())
        .await
        .with_context(|| format!("failed to list users of workspace {workspace}"))?;
    print_users(&users, json)
}

async fn cmd_search(
    client: &ApiClient,
    workspace: &str,
    query: &str,
    warm: bool,
    json: bool,
) -> Result<()> {
    if warm {
        client
            .users(workspace, RequestOptions::default())
            .await
            .with_context(|| format!("failed to load users of workspace {workspace}"))?;
    }

    // Success and error share one channel; whichever fires first wins.
    let (tx, rx) = oneshot::channel::<std::result::Result<Vec<User>, ApiError>>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let error_tx = Arc::clone(&tx);
    let on_error: ErrorCallback = Box::new(move |err: ApiError| {
        if let Some(tx) = error_tx.lock().ok().and_then(|mut slot| slot.take()) {
            let _ = tx.send(Err(err));
        }
    });

    let immediate = client.search().search(
        workspace,
        query,
        move |users| {
            if let Some(tx) = tx.lock().ok().and_then(|mut slot| slot.take()) {
                let _ = tx.send(Ok(users));
            }
        },
        Some(on_error),
    );

    if !json {
        println!("cached:");
    }
    print_users(&immediate, json)?;

    let refined = rx
        .await
        .context("type-ahead request was dropped")?
        .context("type-ahead request failed")?;
    if !json {
        println!("server:");
    }
    print_users(&refined, json)
}

async fn cmd_create_task(client: &ApiClient, workspace: &str, task: &NewTask) -> Result<()> {
    let created = client
        .create_task(workspace, task)
        .await
        .context("failed to create task")?;
    println!("{}", client.task_view_url(workspace, &created.id));
    Ok(())
}

async fn cmd_prime(
    client: ApiClient,
    store: &OptionsStore,
    options: &Options,
    interval_secs: Option<u64>,
) -> Result<()> {
    let interval = Duration::from_secs(interval_secs.unwrap_or(options.prime_interval_secs).max(1));
    let mut primer = CachePrimer::new(Arc::new(client), interval);

    info!(config = %store.path().display(), "priming until Ctrl-C");
    primer.start();
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    primer.stop().await;

    if let Some(at) = primer.last_primed().await {
        info!(last_primed = %at, "cache primer exited");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
