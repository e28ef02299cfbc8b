//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, UniqueViolation, UserChanges, UserConflict, UserSearch};
use crate::models::{Role, User};
use crate::services::user_service::{
    CreateUserInput, UpdateUserInput, UserError, UserPage, UserService,
};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn map_conflict(conflict: UserConflict) -> UserError {
        match conflict {
            UserConflict::Username => {
                UserError::Conflict("Username is already taken".to_string())
            }
            UserConflict::Email => {
                UserError::Conflict("Email is already registered".to_string())
            }
        }
    }

    fn map_write_error(e: anyhow::Error) -> UserError {
        if e.downcast_ref::<UniqueViolation>().is_some() {
            UserError::Conflict("Username or email is already taken".to_string())
        } else {
            UserError::Internal(e.to_string())
        }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn create(&self, input: CreateUserInput) -> Result<User, UserError> {
        if input.username.trim().is_empty() {
            return Err(UserError::Validation("Username is required".to_string()));
        }
        if input.display_name.trim().is_empty() {
            return Err(UserError::Validation("Display name is required".to_string()));
        }
        if !input.email.contains('@') {
            return Err(UserError::Validation("A valid email is required".to_string()));
        }
        if input.password.len() < 8 {
            return Err(UserError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if let Some(conflict) = self
            .store
            .find_user_conflict(Some(&input.username), Some(&input.email), None)
            .await?
        {
            return Err(Self::map_conflict(conflict));
        }

        let new_user = NewUser {
            username: input.username,
            display_name: input.display_name,
            email: input.email,
            password: input.password,
            role: input.role.unwrap_or_default(),
            active: input.active.unwrap_or(true),
            avatar: input.avatar,
        };

        let user = self
            .store
            .create_user(new_user, &self.security)
            .await
            .map_err(Self::map_write_error)?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    async fn get(&self, id: i32) -> Result<User, UserError> {
        self.store.get_user(id).await?.ok_or(UserError::NotFound)
    }

    async fn update(&self, id: i32, input: UpdateUserInput) -> Result<User, UserError> {
        if let Some(username) = &input.username
            && username.trim().is_empty()
        {
            return Err(UserError::Validation("Username cannot be empty".to_string()));
        }
        if let Some(email) = &input.email
            && !email.contains('@')
        {
            return Err(UserError::Validation("A valid email is required".to_string()));
        }

        if input.username.is_some() || input.email.is_some() {
            if let Some(conflict) = self
                .store
                .find_user_conflict(input.username.as_deref(), input.email.as_deref(), Some(id))
                .await?
            {
                return Err(Self::map_conflict(conflict));
            }
        }

        let changes = UserChanges {
            username: input.username,
            display_name: input.display_name,
            email: input.email,
            role: input.role,
            active: input.active,
            avatar: input.avatar,
        };

        self.store
            .update_user(id, changes)
            .await
            .map_err(Self::map_write_error)?
            .ok_or(UserError::NotFound)
    }

    async fn change_password(
        &self,
        id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        if new_password.len() < 8 {
            return Err(UserError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }
        if current_password == new_password {
            return Err(UserError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        self.store.get_user(id).await?.ok_or(UserError::NotFound)?;

        let is_valid = self.store.verify_user_password(id, current_password).await?;
        if !is_valid {
            return Err(UserError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(id, new_password, &self.security)
            .await?;

        info!("Password changed for user {id}");
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), UserError> {
        let user = self.store.get_user(id).await?.ok_or(UserError::NotFound)?;
        if user.lifecycle.is_deleted() {
            return Err(UserError::NotFound);
        }

        let live_notes = self.store.count_live_notes_for_owner(id).await?;
        if live_notes > 0 {
            return Err(UserError::HasAssignedNotes);
        }

        let deleted = self.store.soft_delete_user(id).await?;
        if !deleted {
            return Err(UserError::NotFound);
        }

        info!("Soft-deleted user {id}");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn search(
        &self,
        page: u64,
        limit: u64,
        term: Option<String>,
        role: Option<Role>,
        active: Option<bool>,
    ) -> Result<UserPage, UserError> {
        let params = UserSearch {
            page,
            limit,
            term,
            role,
            active,
        };

        let (items, total, total_pages) = self.store.search_users(&params).await?;

        Ok(UserPage {
            items,
            total,
            total_pages,
        })
    }
}
