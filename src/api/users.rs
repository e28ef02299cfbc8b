use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, MessageResponse, PageDto, UserDto, types::double_option};
use super::validation::{parse_role, validate_limit, validate_page};
use crate::services::{CreateUserInput, UpdateUserInput};

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub term: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub active: Option<bool>,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
}

/// GET /users
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PageDto<UserDto>>, ApiError> {
    let page = validate_page(query.page);
    let limit = validate_limit(query.limit);
    let role = query.role.as_deref().map(parse_role).transpose()?;

    let result = state
        .user_service()
        .search(page, limit, query.term, role, query.active)
        .await?;

    Ok(Json(PageDto {
        items: result.items.into_iter().map(UserDto::from).collect(),
        total: result.total,
        total_pages: result.total_pages,
    }))
}

/// GET /users/all
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.user_service().list_all().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let role = payload.role.as_deref().map(parse_role).transpose()?;

    let user = state
        .user_service()
        .create(CreateUserInput {
            username: payload.username,
            display_name: payload.display_name,
            email: payload.email,
            password: payload.password,
            role,
            active: payload.active,
            avatar: payload.avatar,
        })
        .await?;

    tracing::info!("User created: {}", user.username);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.user_service().get(id).await?;
    Ok(Json(user.into()))
}

/// PATCH /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let role = payload.role.as_deref().map(parse_role).transpose()?;

    let user = state
        .user_service()
        .update(
            id,
            UpdateUserInput {
                username: payload.username,
                display_name: payload.display_name,
                email: payload.email,
                role,
                active: payload.active,
                avatar: payload.avatar,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

/// DELETE /users/{id}
///
/// Soft delete, refused while the user still owns live notes.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service().delete(id).await?;

    tracing::info!("User {id} deleted");

    Ok(Json(MessageResponse::new("User deleted")))
}
