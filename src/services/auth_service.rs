//! Domain service for authentication and account self-registration.
//!
//! Handles login, registration, and the password-reset state machine
//! (`NoResetPending -> ResetRequested -> Consumed | Expired`).

use thiserror::Error;

use crate::models::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No account found for that email")]
    UnknownEmail,

    #[error("Reset token is invalid or expired")]
    InvalidResetToken,

    #[error("Failed to deliver reset email: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the account is
    /// unknown, suspended, deleted, or the password does not match.
    async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError>;

    /// Creates a self-registered account with the lowest-privilege role.
    async fn register(&self, input: RegisterInput) -> Result<User, AuthError>;

    /// Issues a one-time reset ticket and mails the raw secret. A prior
    /// unconsumed ticket is silently overwritten. Delivery failure rolls
    /// the ticket back.
    async fn forgot_password(&self, email: &str) -> Result<(), AuthError>;

    /// Consumes a reset ticket: matches the secret's hash, checks the
    /// 60-minute horizon lazily, rehashes the password, clears the ticket.
    async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<(), AuthError>;
}
