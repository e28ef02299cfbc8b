use serde::Serialize;

use crate::models::{Note, NoteStatus, Role, User};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            role: user.role,
            avatar: user.avatar,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    pub id: i32,
    pub ticket: i64,
    pub owner_id: i32,
    /// Resolved display name; null when the owner was soft-deleted.
    pub owner_name: Option<String>,
    pub title: String,
    pub body: String,
    pub status: NoteStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Note> for NoteDto {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            ticket: note.ticket,
            owner_id: note.owner_id,
            owner_name: note.owner_name,
            title: note.title,
            body: note.body,
            status: note.status,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Paginated result envelope shared by the user and note list endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserDto,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Distinguishes an absent PATCH field from an explicit null. Serde folds
/// both into `None` for `Option<Option<T>>` unless the inner value is
/// captured eagerly like this.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
