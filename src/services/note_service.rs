//! Domain service for notes (assignable work items).

use thiserror::Error;

use crate::models::{Note, NoteStatus};

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Note not found")]
    NotFound,

    #[error("Note owner not found")]
    UnknownOwner,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NoteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for NoteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateNoteInput {
    pub owner_id: i32,
    pub title: String,
    pub body: String,
    pub status: Option<NoteStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNoteInput {
    pub owner_id: Option<i32>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<NoteStatus>,
}

/// Untrusted list parameters, straight from the query string.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    pub page: u64,
    pub limit: u64,
    pub term: Option<String>,
    /// Exclusion filter: matches notes whose status is NOT this value.
    pub status_not: Option<NoteStatus>,
    pub ticket: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NotePage {
    pub items: Vec<Note>,
    pub total: u64,
    pub total_pages: u64,
}

/// Domain service trait for notes.
#[async_trait::async_trait]
pub trait NoteService: Send + Sync {
    /// Creates a note, allocating the next ticket number atomically.
    async fn create(&self, input: CreateNoteInput) -> Result<Note, NoteError>;

    /// Primary-key lookup; soft-deleted notes are still returned.
    async fn get(&self, id: i32) -> Result<Note, NoteError>;

    async fn update(&self, id: i32, input: UpdateNoteInput) -> Result<Note, NoteError>;

    /// Soft delete; no referential preconditions.
    async fn delete(&self, id: i32) -> Result<(), NoteError>;

    async fn list_all(&self) -> Result<Vec<Note>, NoteError>;

    async fn search(&self, query: NoteQuery) -> Result<NotePage, NoteError>;
}
