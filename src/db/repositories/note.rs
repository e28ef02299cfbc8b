use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::map_write_err;
use crate::entities::{prelude::*, notes, users};
use crate::models::{Lifecycle, Note, NoteStatus};

fn map_row(model: notes::Model, owner: Option<users::Model>) -> Note {
    Note {
        id: model.id,
        owner_id: model.owner_id,
        owner_name: owner.and_then(|u| (!u.is_deleted).then_some(u.display_name)),
        title: model.title,
        body: model.body,
        status: model.status.parse().unwrap_or_default(),
        ticket: model.ticket,
        lifecycle: Lifecycle::from_columns(model.is_deleted, model.deleted_at),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: i32,
    pub title: String,
    pub body: String,
    pub status: NoteStatus,
    pub ticket: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub owner_id: Option<i32>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<NoteStatus>,
}

/// Composed filter for a paginated note search. `owner_ids` and
/// `title_term` are mutually exclusive interpretations of the free-text
/// term; the caller picks one. `status_not` is an exclusion filter by
/// inherited convention.
#[derive(Debug, Clone, Default)]
pub struct NoteSearch {
    pub page: u64,
    pub limit: u64,
    pub owner_ids: Option<Vec<i32>>,
    pub title_term: Option<String>,
    pub status_not: Option<NoteStatus>,
    pub ticket: Option<i64>,
}

pub struct NoteRepository {
    conn: DatabaseConnection,
}

impl NoteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new_note: NewNote) -> Result<Note> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = notes::ActiveModel {
            owner_id: Set(new_note.owner_id),
            title: Set(new_note.title),
            body: Set(new_note.body),
            status: Set(new_note.status.as_str().to_string()),
            ticket: Set(new_note.ticket),
            is_deleted: Set(false),
            deleted_at: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await.map_err(map_write_err)?;
        let id = model.id;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Note {id} vanished after insert"))
    }

    /// Primary-key lookup, soft-deleted rows included.
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Note>> {
        let result = Notes::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query note by ID")?;

        Ok(result.map(|(note, owner)| map_row(note, owner)))
    }

    /// Case-insensitive title probe. Deliberately scans deleted rows too:
    /// inherited behavior keeps a deleted note's title reserved.
    pub async fn title_exists(&self, title: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = Notes::find().filter(
            Expr::expr(Func::lower(Expr::col(notes::Column::Title))).eq(title.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(notes::Column::Id.ne(id));
        }

        Ok(query.count(&self.conn).await? > 0)
    }

    pub async fn update(&self, id: i32, changes: NoteChanges) -> Result<Option<Note>> {
        let Some(note) = Notes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query note for update")?
        else {
            return Ok(None);
        };

        let mut active: notes::ActiveModel = note.into();

        if let Some(owner_id) = changes.owner_id {
            active.owner_id = Set(owner_id);
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(body) = changes.body {
            active.body = Set(body);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await.map_err(map_write_err)?;
        self.get_by_id(model.id).await
    }

    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let Some(note) = Notes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query note for deletion")?
        else {
            return Ok(false);
        };

        if note.is_deleted {
            return Ok(false);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: notes::ActiveModel = note.into();
        active.is_deleted = Set(true);
        active.deleted_at = Set(Some(now.clone()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn list_live(&self) -> Result<Vec<Note>> {
        let rows = Notes::find()
            .filter(notes::Column::IsDeleted.eq(false))
            .order_by_desc(notes::Column::CreatedAt)
            .find_also_related(users::Entity)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(note, owner)| map_row(note, owner))
            .collect())
    }

    /// Count of live notes still owned by this user; the referential guard
    /// refuses to delete an owner while this is non-zero.
    pub async fn count_live_for_owner(&self, owner_id: i32) -> Result<u64> {
        let count = Notes::find()
            .filter(notes::Column::OwnerId.eq(owner_id))
            .filter(notes::Column::IsDeleted.eq(false))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    pub async fn search(&self, params: &NoteSearch) -> Result<(Vec<Note>, u64, u64)> {
        let mut query = Notes::find()
            .filter(notes::Column::IsDeleted.eq(false))
            .order_by_desc(notes::Column::CreatedAt);

        if let Some(owner_ids) = &params.owner_ids {
            query = query.filter(notes::Column::OwnerId.is_in(owner_ids.iter().copied()));
        } else if let Some(term) = &params.title_term {
            query = query.filter(notes::Column::Title.contains(term));
        }

        if let Some(status) = params.status_not {
            // Exclusion on purpose: matches rows whose status is NOT the
            // given value. Inherited behavior, kept for compatibility.
            query = query.filter(notes::Column::Status.ne(status.as_str()));
        }

        if let Some(ticket) = params.ticket {
            query = query.filter(notes::Column::Ticket.eq(ticket));
        }

        let paginator = query
            .find_also_related(users::Entity)
            .paginate(&self.conn, params.limit);
        let counts = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(params.page - 1).await?;

        Ok((
            items
                .into_iter()
                .map(|(note, owner)| map_row(note, owner))
                .collect(),
            counts.number_of_items,
            counts.number_of_pages,
        ))
    }
}
