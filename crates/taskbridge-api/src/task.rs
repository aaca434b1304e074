//! Task records for the pass-through task calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskbridge_directory::Workspace;

/// A task as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireTask")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub notes: Option<String>,
    pub workspace: Option<Workspace>,
}

/// Fields for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// User id of the assignee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl NewTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
struct WireTask {
    #[serde(default)]
    gid: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    workspace: Option<Workspace>,
}

impl TryFrom<WireTask> for Task {
    type Error = String;

    fn try_from(wire: WireTask) -> Result<Self, Self::Error> {
        let id = match wire.gid.or(wire.id) {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err("task is missing both `gid` and `id`".to_string()),
        };
        Ok(Self {
            id,
            name: wire.name.unwrap_or_default(),
            notes: wire.notes.filter(|n| !n.is_empty()),
            workspace: wire.workspace,
        })
    }
}
