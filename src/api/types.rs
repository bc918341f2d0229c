use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;

/// Authenticated user profile returned by `GET /auth/me`.
///
/// The backend has written the identifier as `id` or `_id` depending on how
/// the document was serialized; both are kept and resolved through
/// [`UserProfile::user_id`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<String>,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default)]
    pub is_active: bool,

    /// "user", "moderator", or "admin"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserProfile {
    /// Stable identifier for this user, whichever field the backend used.
    pub fn user_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.mongo_id.as_deref())
    }

    /// Display name for optimistic chat entries; `None` when the profile has
    /// no usable name.
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// Study group detail payload from `GET /study-groups/{id}`, narrowed to the
/// fields the chat feature consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub members: Vec<String>,

    /// Chat backlog used to seed a live session.
    #[serde(default)]
    pub chat: Vec<ChatMessage>,

    #[serde(default)]
    pub is_public: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl StudyGroup {
    /// Stable identifier for this group, whichever field the backend used.
    pub fn group_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.mongo_id.as_deref())
    }
}

/// Envelope for `GET /study-groups/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupMessages {
    pub messages: Vec<ChatMessage>,
}
