use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user. May point at a soft-deleted user; the orphaned
    /// reference is tolerated, not an error.
    pub owner_id: i32,

    pub title: String,

    pub body: String,

    /// One of "open", "in-progress", "closed"
    pub status: String,

    /// Human-facing sequence number, assigned once at creation and never
    /// reused, even after deletion.
    #[sea_orm(unique)]
    pub ticket: i64,

    pub is_deleted: bool,

    pub deleted_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
