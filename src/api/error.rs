use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::services::{AuthError, NoteError, UserError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Conflict(String),

    /// Missing or malformed credentials.
    Unauthenticated(String),

    /// Credentials present and well-formed but rejected.
    Forbidden(String),

    /// Maps to 400, not 404: inherited convention, kept for client
    /// compatibility.
    NotFound(String),

    /// Business precondition failed (e.g. deleting a user who still owns
    /// live notes).
    Precondition(String),

    TooManyRequests(String),

    DeliveryError(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            ApiError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {msg}"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Precondition(msg) => write!(f, "Precondition failed: {msg}"),
            ApiError::TooManyRequests(msg) => write!(f, "Too many requests: {msg}"),
            ApiError::DeliveryError(msg) => write!(f, "Delivery error: {msg}"),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error envelope. `isError` is only present (and true) on uncategorized
/// server-side failures; categorized errors carry the message alone.
#[derive(Serialize)]
struct ErrorBody {
    message: String,

    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    is_error: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, is_error) = match &self {
            ApiError::ValidationError(msg)
            | ApiError::NotFound(msg)
            | ApiError::Precondition(msg) => (StatusCode::BAD_REQUEST, msg.clone(), false),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), false),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), false),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), false),
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, msg.clone(), false)
            }
            ApiError::DeliveryError(msg) => {
                tracing::error!("Mail delivery error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to send email".to_string(),
                    true,
                )
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    true,
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    true,
                )
            }
        };

        let body = ErrorBody { message, is_error };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::Unauthenticated("Invalid credentials".to_string())
            }
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::UnknownEmail => {
                ApiError::NotFound("No account found for that email".to_string())
            }
            AuthError::InvalidResetToken => {
                ApiError::ValidationError("Reset token is invalid or expired".to_string())
            }
            AuthError::Delivery(msg) => ApiError::DeliveryError(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => ApiError::NotFound("User not found".to_string()),
            UserError::Conflict(msg) => ApiError::Conflict(msg),
            UserError::Validation(msg) => ApiError::ValidationError(msg),
            UserError::HasAssignedNotes => {
                ApiError::Precondition("User has assigned notes".to_string())
            }
            UserError::Database(msg) => ApiError::DatabaseError(msg),
            UserError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::NotFound => ApiError::NotFound("Note not found".to_string()),
            NoteError::UnknownOwner => ApiError::NotFound("Note owner not found".to_string()),
            NoteError::Conflict(msg) => ApiError::Conflict(msg),
            NoteError::Validation(msg) => ApiError::ValidationError(msg),
            NoteError::Database(msg) => ApiError::DatabaseError(msg),
            NoteError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }
}
