//! `SeaORM` implementation of the `NoteService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{NewNote, NoteChanges, NoteSearch, Store, UniqueViolation};
use crate::models::Note;
use crate::services::note_service::{
    CreateNoteInput, NoteError, NotePage, NoteQuery, NoteService, UpdateNoteInput,
};

pub struct SeaOrmNoteService {
    store: Store,
}

impl SeaOrmNoteService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Title uniqueness probe. Deliberately scans soft-deleted notes too;
    /// a retired title stays reserved.
    async fn check_title(&self, title: &str, exclude_id: Option<i32>) -> Result<(), NoteError> {
        if self.store.note_title_exists(title, exclude_id).await? {
            return Err(NoteError::Conflict("Note title is already in use".to_string()));
        }
        Ok(())
    }

    fn map_write_error(e: anyhow::Error) -> NoteError {
        if e.downcast_ref::<UniqueViolation>().is_some() {
            NoteError::Conflict("Note title is already in use".to_string())
        } else {
            NoteError::Internal(e.to_string())
        }
    }
}

#[async_trait]
impl NoteService for SeaOrmNoteService {
    async fn create(&self, input: CreateNoteInput) -> Result<Note, NoteError> {
        if input.title.trim().is_empty() {
            return Err(NoteError::Validation("Title is required".to_string()));
        }
        if input.body.trim().is_empty() {
            return Err(NoteError::Validation("Body is required".to_string()));
        }

        self.store
            .get_user(input.owner_id)
            .await?
            .ok_or(NoteError::UnknownOwner)?;

        self.check_title(&input.title, None).await?;

        // Allocated before the insert; a failed insert burns the number,
        // which is fine since tickets are only ever handed out once.
        let ticket = self.store.next_ticket().await?;

        let new_note = NewNote {
            owner_id: input.owner_id,
            title: input.title,
            body: input.body,
            status: input.status.unwrap_or_default(),
            ticket,
        };

        let note = self
            .store
            .create_note(new_note)
            .await
            .map_err(Self::map_write_error)?;

        info!("Created note {} (ticket {})", note.id, note.ticket);
        Ok(note)
    }

    async fn get(&self, id: i32) -> Result<Note, NoteError> {
        self.store.get_note(id).await?.ok_or(NoteError::NotFound)
    }

    async fn update(&self, id: i32, input: UpdateNoteInput) -> Result<Note, NoteError> {
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(NoteError::Validation("Title cannot be empty".to_string()));
            }
            self.check_title(title, Some(id)).await?;
        }
        if let Some(body) = &input.body
            && body.trim().is_empty()
        {
            return Err(NoteError::Validation("Body cannot be empty".to_string()));
        }

        if let Some(owner_id) = input.owner_id {
            self.store
                .get_user(owner_id)
                .await?
                .ok_or(NoteError::UnknownOwner)?;
        }

        let changes = NoteChanges {
            owner_id: input.owner_id,
            title: input.title,
            body: input.body,
            status: input.status,
        };

        self.store
            .update_note(id, changes)
            .await
            .map_err(Self::map_write_error)?
            .ok_or(NoteError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<(), NoteError> {
        let deleted = self.store.soft_delete_note(id).await?;
        if !deleted {
            return Err(NoteError::NotFound);
        }

        info!("Soft-deleted note {id}");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Note>, NoteError> {
        Ok(self.store.list_notes().await?)
    }

    async fn search(&self, query: NoteQuery) -> Result<NotePage, NoteError> {
        // A free-text term is first read as an owner display name; only
        // when no owner matches does it fall back to a title match. The
        // two interpretations are mutually exclusive per request.
        let (owner_ids, title_term) = match &query.term {
            Some(term) => {
                let ids = self.store.find_owner_ids_by_display_name(term).await?;
                if ids.is_empty() {
                    (None, Some(term.clone()))
                } else {
                    (Some(ids), None)
                }
            }
            None => (None, None),
        };

        let params = NoteSearch {
            page: query.page,
            limit: query.limit,
            owner_ids,
            title_term,
            status_not: query.status_not,
            ticket: query.ticket,
        };

        let (items, total, total_pages) = self.store.search_notes(&params).await?;

        Ok(NotePage {
            items,
            total,
            total_pages,
        })
    }
}
