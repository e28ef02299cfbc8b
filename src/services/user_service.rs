//! Domain service for user management and account self-service.

use thiserror::Error;

use crate::models::{Role, User};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referential guard: the user still owns live notes.
    #[error("User has assigned notes")]
    HasAssignedNotes,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub avatar: Option<String>,
}

/// Partial update; None leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub avatar: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: u64,
    pub total_pages: u64,
}

/// Domain service trait for user management.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, input: CreateUserInput) -> Result<User, UserError>;

    /// Primary-key lookup; soft-deleted users are still returned.
    async fn get(&self, id: i32) -> Result<User, UserError>;

    async fn update(&self, id: i32, input: UpdateUserInput) -> Result<User, UserError>;

    /// Re-verifies the current password before storing the new one.
    async fn change_password(
        &self,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError>;

    /// Soft delete. Refused while any live note still references the user
    /// as owner.
    async fn delete(&self, id: i32) -> Result<(), UserError>;

    async fn list_all(&self) -> Result<Vec<User>, UserError>;

    async fn search(
        &self,
        page: u64,
        limit: u64,
        term: Option<String>,
        role: Option<Role>,
        active: Option<bool>,
    ) -> Result<UserPage, UserError>;
}
