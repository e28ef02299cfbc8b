use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::models::{Note, User};

pub mod migrator;
pub mod repositories;

pub use repositories::UniqueViolation;
pub use repositories::note::{NewNote, NoteChanges, NoteSearch};
pub use repositories::user::{NewUser, UserChanges, UserConflict, UserSearch};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn note_repo(&self) -> repositories::note::NoteRepository {
        repositories::note::NoteRepository::new(self.conn.clone())
    }

    fn counter_repo(&self) -> repositories::counter::CounterRepository {
        repositories::counter::CounterRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        self.user_repo().get_credentials(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn find_user_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<Option<UserConflict>> {
        self.user_repo()
            .find_conflict(username, email, exclude_id)
            .await
    }

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn verify_user_password(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, config)
            .await
    }

    pub async fn soft_delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().soft_delete(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_live().await
    }

    pub async fn search_users(&self, params: &UserSearch) -> Result<(Vec<User>, u64, u64)> {
        self.user_repo().search(params).await
    }

    pub async fn find_owner_ids_by_display_name(&self, term: &str) -> Result<Vec<i32>> {
        self.user_repo().find_ids_by_display_name(term).await
    }

    pub async fn set_reset_ticket(
        &self,
        id: i32,
        token_hash: Option<String>,
        requested_at: Option<String>,
    ) -> Result<()> {
        self.user_repo()
            .set_reset_ticket(id, token_hash, requested_at)
            .await
    }

    pub async fn find_user_by_reset_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().find_by_reset_hash(token_hash).await
    }

    // ========== Notes ==========

    pub async fn get_note(&self, id: i32) -> Result<Option<Note>> {
        self.note_repo().get_by_id(id).await
    }

    pub async fn note_title_exists(&self, title: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.note_repo().title_exists(title, exclude_id).await
    }

    pub async fn create_note(&self, new_note: NewNote) -> Result<Note> {
        self.note_repo().create(new_note).await
    }

    pub async fn update_note(&self, id: i32, changes: NoteChanges) -> Result<Option<Note>> {
        self.note_repo().update(id, changes).await
    }

    pub async fn soft_delete_note(&self, id: i32) -> Result<bool> {
        self.note_repo().soft_delete(id).await
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        self.note_repo().list_live().await
    }

    pub async fn search_notes(&self, params: &NoteSearch) -> Result<(Vec<Note>, u64, u64)> {
        self.note_repo().search(params).await
    }

    pub async fn count_live_notes_for_owner(&self, owner_id: i32) -> Result<u64> {
        self.note_repo().count_live_for_owner(owner_id).await
    }

    // ========== Counters ==========

    pub async fn next_ticket(&self) -> Result<i64> {
        self.counter_repo()
            .next(crate::constants::tickets::COUNTER_NAME)
            .await
    }
}
