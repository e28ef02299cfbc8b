use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub username: String,

    pub display_name: String,

    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// One of "employee", "manager", "admin"
    pub role: String,

    pub avatar: Option<String>,

    /// Soft-suspend flag, independent of soft delete
    pub active: bool,

    pub is_deleted: bool,

    pub deleted_at: Option<String>,

    /// SHA-256 hex of the pending reset secret, if any
    pub reset_token_hash: Option<String>,

    pub reset_requested_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::notes::Entity")]
    Notes,
}

impl Related<super::notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
