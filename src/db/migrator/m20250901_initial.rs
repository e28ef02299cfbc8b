use crate::constants::tickets;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the seeded admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"changeme";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Notes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Counters)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Unique indexes close the check-then-write race at the storage
        // layer. Username/email are only unique among live rows; note
        // titles stay reserved even after soft delete.
        let conn = manager.get_connection();
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username_live \
             ON users (username COLLATE NOCASE) WHERE is_deleted = 0",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_live \
             ON users (email) WHERE is_deleted = 0",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_notes_title \
             ON notes (title COLLATE NOCASE)",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes (owner_id)",
        )
        .await?;

        // Seed the ticket counter one below the first number handed out.
        let seed_counter = sea_orm_migration::sea_query::Query::insert()
            .into_table(Counters)
            .columns([
                crate::entities::counters::Column::Name,
                crate::entities::counters::Column::Value,
            ])
            .values_panic([
                tickets::COUNTER_NAME.into(),
                (tickets::SEQUENCE_START - 1).into(),
            ])
            .to_owned();

        manager.exec_stmt(seed_counter).await?;

        // Seed a bootstrap admin so the instance is reachable before any
        // self-registration happens.
        let now = chrono::Utc::now().to_rfc3339();
        let password_hash = hash_default_password();

        let seed_admin = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Username,
                crate::entities::users::Column::DisplayName,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::Active,
                crate::entities::users::Column::IsDeleted,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "admin".into(),
                "Administrator".into(),
                "admin@notedesk.local".into(),
                password_hash.into(),
                "admin".into(),
                true.into(),
                false.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(seed_admin).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Counters).to_owned())
            .await?;

        Ok(())
    }
}
