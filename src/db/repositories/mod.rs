pub mod counter;
pub mod note;
pub mod user;

use sea_orm::{DbErr, SqlErr};

/// Marker error for storage-level unique index violations, so callers can
/// translate a lost check-then-write race into the same conflict response
/// the application-level check produces.
#[derive(Debug, thiserror::Error)]
#[error("Unique constraint violated: {0}")]
pub struct UniqueViolation(pub String);

/// Wrap a database error, surfacing unique index violations as
/// [`UniqueViolation`] for downcasting.
pub fn map_write_err(err: DbErr) -> anyhow::Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => anyhow::Error::new(UniqueViolation(msg)),
        _ => err.into(),
    }
}
