use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{non_empty, parse_status, validate_limit, validate_page};
use super::{ApiError, AppState, MessageResponse, NoteDto, PageDto};
use crate::services::{CreateNoteInput, NoteQuery, UpdateNoteInput};

#[derive(Deserialize)]
pub struct ListNotesQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub term: Option<String>,
    /// Exclusion filter: notes whose status is NOT this value.
    pub status: Option<String>,
    pub ticket: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub owner_id: i32,
    pub title: String,
    pub body: String,
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub owner_id: Option<i32>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
}

/// GET /notes
pub async fn search_notes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<PageDto<NoteDto>>, ApiError> {
    let page = validate_page(query.page);
    let limit = validate_limit(query.limit);
    let status_not = query.status.as_deref().map(parse_status).transpose()?;

    let result = state
        .note_service()
        .search(NoteQuery {
            page,
            limit,
            term: query.term,
            status_not,
            ticket: query.ticket,
        })
        .await?;

    Ok(Json(PageDto {
        items: result.items.into_iter().map(NoteDto::from).collect(),
        total: result.total,
        total_pages: result.total_pages,
    }))
}

/// GET /notes/all
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NoteDto>>, ApiError> {
    let notes = state.note_service().list_all().await?;
    Ok(Json(notes.into_iter().map(NoteDto::from).collect()))
}

/// POST /notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteDto>), ApiError> {
    non_empty(&payload.title, "Title")?;
    non_empty(&payload.body, "Body")?;
    let status = payload.status.as_deref().map(parse_status).transpose()?;

    let note = state
        .note_service()
        .create(CreateNoteInput {
            owner_id: payload.owner_id,
            title: payload.title,
            body: payload.body,
            status,
        })
        .await?;

    tracing::info!("Note created: ticket {}", note.ticket);

    Ok((StatusCode::CREATED, Json(note.into())))
}

/// GET /notes/{id}
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<NoteDto>, ApiError> {
    let note = state.note_service().get(id).await?;
    Ok(Json(note.into()))
}

/// PATCH /notes/{id}
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<NoteDto>, ApiError> {
    let status = payload.status.as_deref().map(parse_status).transpose()?;

    let note = state
        .note_service()
        .update(
            id,
            UpdateNoteInput {
                owner_id: payload.owner_id,
                title: payload.title,
                body: payload.body,
                status,
            },
        )
        .await?;

    Ok(Json(note.into()))
}

/// DELETE /notes/{id}
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.note_service().delete(id).await?;

    tracing::info!("Note {id} deleted");

    Ok(Json(MessageResponse::new("Note deleted")))
}
