//! Self-service profile endpoints. Unlike /users, these are gated to the
//! session's own account: the token subject must match the path id.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, MessageResponse, UserDto, types::double_option};
use crate::services::{Claims, UpdateUserInput};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar: Option<Option<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn require_self(claims: &Claims, id: i32) -> Result<(), ApiError> {
    if claims.sub != id {
        return Err(ApiError::Forbidden(
            "Cannot access another user's account".to_string(),
        ));
    }
    Ok(())
}

/// GET /account/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, ApiError> {
    require_self(&claims, id)?;

    let user = state.user_service().get(id).await?;
    Ok(Json(user.into()))
}

/// PATCH /account/{id}
///
/// Profile fields only; role and active are off-limits here and go through
/// /users instead.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<UserDto>, ApiError> {
    require_self(&claims, id)?;

    let user = state
        .user_service()
        .update(
            id,
            UpdateUserInput {
                username: payload.username,
                display_name: payload.display_name,
                email: payload.email,
                avatar: payload.avatar,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(user.into()))
}

/// PUT /account/{id}
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_self(&claims, id)?;

    state
        .user_service()
        .change_password(id, &payload.current_password, &payload.new_password)
        .await?;

    tracing::info!("Password changed for user {id}");

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
