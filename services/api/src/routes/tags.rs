//! Tag handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{Tag, TagPatch, TagPayload, TagQuery},
};

/// List the caller's tags
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TagQuery>,
) -> ApiResult<impl IntoResponse> {
    let tags = state
        .tag_repository
        .list_for_user(user.id, query.assigned_only())
        .await?;

    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<TagPayload>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::BadRequest)?;

    let tag = state
        .tag_repository
        .create(user.id, payload.name.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_repository
        .get_for_user(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(tag))
}

/// Full update
pub async fn replace_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagPayload>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::BadRequest)?;
    apply_update(&state, &user, id, Some(payload.name.trim())).await
}

/// Partial update
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TagPatch>,
) -> ApiResult<impl IntoResponse> {
    patch.validate().map_err(ApiError::BadRequest)?;
    apply_update(&state, &user, id, patch.name.as_deref().map(str::trim)).await
}

async fn apply_update(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    name: Option<&str>,
) -> ApiResult<Json<Tag>> {
    let tag = state
        .tag_repository
        .update(user.id, id, name)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Updated tag {} for user {}", tag.id, user.id);
    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.tag_repository.delete(user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted tag {} for user {}", id, user.id);
    Ok(StatusCode::NO_CONTENT)
}
