//! Records shared between the directory and the API layer.
//!
//! The remote API has shipped two identifier styles over time: a numeric
//! `id` and a string `gid`.  Both are accepted on the wire and normalized to
//! an opaque `String`.  User photos arrive either as a bare URL or as an
//! object keyed by image size; the directory only keeps a single URL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Photo sizes in order of preference when a photo object is received.
const PHOTO_SIZE_PREFERENCE: [&str; 5] = [
    "image_60x60",
    "image_128x128",
    "image_21x21",
    "image_27x27",
    "image_36x36",
];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A user known to belong to some workspace.
///
/// Records are immutable by replacement: a later observation of the same
/// `id` overwrites the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireUser")]
pub struct User {
    /// Opaque identifier, unique within a workspace.
    pub id: String,
    /// Display name; may be empty for deactivated accounts.
    pub name: String,
    /// URL of the user's photo, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl User {
    /// Build a user record without a photo.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            photo: None,
        }
    }

    /// Attach a photo URL.
    #[must_use]
    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        self.photo = Some(url.into());
        self
    }
}

/// A tenant boundary scoping users and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRef")]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

impl Workspace {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The authenticated user together with the workspaces they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireCurrentUser")]
pub struct CurrentUser {
    pub user: User,
    pub workspaces: Vec<Workspace>,
}

// ---------------------------------------------------------------------------
// Wire forms
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePhoto {
    Url(String),
    Sizes(BTreeMap<String, Option<String>>),
}

impl WirePhoto {
    fn into_url(self) -> Option<String> {
        match self {
            Self::Url(url) if !url.is_empty() => Some(url),
            Self::Url(_) => None,
            Self::Sizes(mut sizes) => PHOTO_SIZE_PREFERENCE
                .iter()
                .find_map(|key| sizes.remove(*key).flatten()),
        }
    }
}

fn resolve_id(gid: Option<WireId>, id: Option<WireId>) -> Result<String, String> {
    gid.or(id)
        .map(String::from)
        .ok_or_else(|| "record is missing both `gid` and `id`".to_string())
}

#[derive(Deserialize)]
struct WireRef {
    #[serde(default)]
    gid: Option<WireId>,
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<WireRef> for Workspace {
    type Error = String;

    fn try_from(wire: WireRef) -> Result<Self, Self::Error> {
        Ok(Self {
            id: resolve_id(wire.gid, wire.id)?,
            name: wire.name.unwrap_or_default(),
        })
    }
}

#[derive(Deserialize)]
struct WireUser {
    #[serde(default)]
    gid: Option<WireId>,
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    photo: Option<WirePhoto>,
}

impl TryFrom<WireUser> for User {
    type Error = String;

    fn try_from(wire: WireUser) -> Result<Self, Self::Error> {
        Ok(Self {
            id: resolve_id(wire.gid, wire.id)?,
            name: wire.name.unwrap_or_default(),
            photo: wire.photo.and_then(WirePhoto::into_url),
        })
    }
}

#[derive(Deserialize)]
struct WireCurrentUser {
    #[serde(default)]
    gid: Option<WireId>,
    #[serde(default)]
    id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    photo: Option<WirePhoto>,
    #[serde(default)]
    workspaces: Vec<Workspace>,
}

impl TryFrom<WireCurrentUser> for CurrentUser {
    type Error = String;

    fn try_from(wire: WireCurrentUser) -> Result<Self, Self::Error> {
        let user = User::try_from(WireUser {
            gid: wire.gid,
            id: wire.id,
            name: wire.name,
            photo: wire.photo,
        })?;
        Ok(Self {
            user,
            workspaces: wire.workspaces,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_id_is_normalized() {
        let user: User = serde_json::from_value(json!({"id": 42, "name": "Ann"})).unwrap();
        assert_eq!(user, User::new("42", "Ann"));
    }

    #[test]
    fn gid_wins_over_id() {
        let user: User =
            serde_json::from_value(json!({"gid": "1200", "id": 7, "name": "Bo"})).unwrap();
        assert_eq!(user.id, "1200");
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let result = serde_json::from_value::<User>(json!({"name": "Nobody"}));
        assert!(result.is_err());
    }

    #[test]
    fn photo_object_prefers_small_image() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "name": "Ann",
            "photo": {
                "image_128x128": "https://img/128.png",
                "image_60x60": "https://img/60.png"
            }
        }))
        .unwrap();
        assert_eq!(user.photo.as_deref(), Some("https://img/60.png"));
    }

    #[test]
    fn photo_object_falls_back_to_other_sizes() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "name": "Ann",
            "photo": {
                "image_60x60": null,
                "image_36x36": "https://img/36.png",
                "image_27x27": "https://img/27.png",
                "image_21x21": "https://img/21.png"
            }
        }))
        .unwrap();
        assert_eq!(user.photo.as_deref(), Some("https://img/21.png"));
    }

    #[test]
    fn null_photo_and_name_are_tolerated() {
        let user: User =
            serde_json::from_value(json!({"id": "9", "name": null, "photo": null})).unwrap();
        assert_eq!(user.name, "");
        assert!(user.photo.is_none());
    }

    #[test]
    fn current_user_carries_workspaces() {
        let me: CurrentUser = serde_json::from_value(json!({
            "id": 5,
            "name": "Me",
            "workspaces": [{"id": 100, "name": "Acme"}, {"gid": "200", "name": "Side"}]
        }))
        .unwrap();
        assert_eq!(me.user.id, "5");
        assert_eq!(
            me.workspaces,
            vec![Workspace::new("100", "Acme"), Workspace::new("200", "Side")]
        );
    }
}
