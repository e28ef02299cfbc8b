use sea_orm::entity::prelude::*;

/// Named persistent sequences. Ticket numbers are allocated from here with
/// an increment-and-read inside a transaction so they survive restarts and
/// stay collision-free under concurrent writers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    pub value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
