use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tokio::task;

use super::map_write_err;
use crate::config::SecurityConfig;
use crate::entities::{prelude::*, users};
use crate::models::{Lifecycle, Role, User};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            email: model.email,
            role: model.role.parse().unwrap_or_default(),
            avatar: model.avatar,
            active: model.active,
            lifecycle: Lifecycle::from_columns(model.is_deleted, model.deleted_at),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Insert payload; the raw password is hashed inside the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub active: bool,
    pub avatar: Option<String>,
}

/// Partial update; None leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub avatar: Option<Option<String>>,
}

/// Which uniqueness key an existing live row already occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserConflict {
    Username,
    Email,
}

#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    pub page: u64,
    pub limit: u64,
    pub term: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Primary-key lookups ignore the soft-delete flag: an already-deleted
    /// user is still retrievable by id.
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Live-row lookup by username, with the password hash for credential
    /// verification.
    pub async fn get_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::IsDeleted.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::IsDeleted.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Case-insensitive username / exact email probe against live rows,
    /// excluding the row being updated. This is the friendly half of the
    /// uniqueness guard; the partial unique indexes are the backstop for
    /// the race two concurrent writers can still win together.
    pub async fn find_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<Option<UserConflict>> {
        if let Some(username) = username {
            let mut query = Users::find()
                .filter(users::Column::IsDeleted.eq(false))
                .filter(
                    Expr::expr(Func::lower(Expr::col(users::Column::Username)))
                        .eq(username.to_lowercase()),
                );
            if let Some(id) = exclude_id {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.count(&self.conn).await? > 0 {
                return Ok(Some(UserConflict::Username));
            }
        }

        if let Some(email) = email {
            let mut query = Users::find()
                .filter(users::Column::IsDeleted.eq(false))
                .filter(users::Column::Email.eq(email));
            if let Some(id) = exclude_id {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.count(&self.conn).await? > 0 {
                return Ok(Some(UserConflict::Email));
            }
        }

        Ok(None)
    }

    pub async fn create(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        let password = new_user.password;
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active_model = users::ActiveModel {
            username: Set(new_user.username),
            display_name: Set(new_user.display_name),
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            role: Set(new_user.role.as_str().to_string()),
            avatar: Set(new_user.avatar),
            active: Set(new_user.active),
            is_deleted: Set(false),
            deleted_at: Set(None),
            reset_token_hash: Set(None),
            reset_requested_at: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await.map_err(map_write_err)?;
        Ok(User::from(model))
    }

    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();

        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(display_name) = changes.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(role) = changes.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(is_active) = changes.active {
            active.active = Set(is_active);
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = Set(avatar);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await.map_err(map_write_err)?;
        Ok(Some(User::from(model)))
    }

    /// Verify a password against the stored hash.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, id: i32, password: &str) -> Result<bool> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        verify_against_hash(user.password_hash, password.to_string()).await
    }

    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Soft delete: flips the lifecycle state, never removes the row. The
    /// referential guard against live notes lives in the service layer.
    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for deletion")?
        else {
            return Ok(false);
        };

        if user.is_deleted {
            return Ok(false);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(now.clone()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn list_live(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .filter(users::Column::IsDeleted.eq(false))
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Live user ids whose display name contains the term,
    /// case-insensitively. Used to reinterpret a note search term as an
    /// owner filter.
    pub async fn find_ids_by_display_name(&self, term: &str) -> Result<Vec<i32>> {
        let rows = Users::find()
            .filter(users::Column::IsDeleted.eq(false))
            .filter(users::Column::DisplayName.contains(term))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|u| u.id).collect())
    }

    pub async fn search(&self, params: &UserSearch) -> Result<(Vec<User>, u64, u64)> {
        let mut query = Users::find()
            .filter(users::Column::IsDeleted.eq(false))
            .order_by_desc(users::Column::CreatedAt);

        if let Some(term) = &params.term {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Username.contains(term))
                    .add(users::Column::DisplayName.contains(term)),
            );
        }

        if let Some(role) = params.role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }

        if let Some(active) = params.active {
            query = query.filter(users::Column::Active.eq(active));
        }

        let paginator = query.paginate(&self.conn, params.limit);
        let counts = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(params.page - 1).await?;

        Ok((
            items.into_iter().map(User::from).collect(),
            counts.number_of_items,
            counts.number_of_pages,
        ))
    }

    // ===== Password reset ticket =====

    /// Persist (or clear) the pending reset ticket. Only the one-way hash
    /// of the secret is stored; a new request silently overwrites a prior
    /// unconsumed one.
    pub async fn set_reset_ticket(
        &self,
        id: i32,
        token_hash: Option<String>,
        requested_at: Option<String>,
    ) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset ticket update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.reset_token_hash = Set(token_hash);
        active.reset_requested_at = Set(requested_at);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Look up the live user holding this reset ticket hash, returning the
    /// issuance timestamp alongside for the lazy expiry check.
    pub async fn find_by_reset_hash(&self, token_hash: &str) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::ResetTokenHash.eq(token_hash))
            .filter(users::Column::IsDeleted.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")?;

        Ok(user.and_then(|u| {
            let requested_at = u.reset_requested_at.clone()?;
            Some((User::from(u), requested_at))
        }))
    }
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Check a password against an already-fetched hash.
/// Note: This uses `spawn_blocking` because Argon2 verification is
/// CPU-intensive and would block the async runtime if run directly.
pub async fn verify_against_hash(password_hash: String, password: String) -> Result<bool> {
    // Run CPU-intensive password verification in a blocking task
    let is_valid = task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")??;

    Ok(is_valid)
}
