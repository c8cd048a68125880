//! Recipe handlers

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
    models::{Recipe, RecipePatch, RecipePayload, RecipeQuery, RecipeSummary},
};

/// List the caller's recipes, optionally filtered by tag ids
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RecipeQuery>,
) -> ApiResult<impl IntoResponse> {
    let tag_ids = query.tag_ids().map_err(ApiError::BadRequest)?;

    let recipes: Vec<RecipeSummary> = state
        .recipe_repository
        .list_for_user(user.id, &tag_ids)
        .await?
        .into_iter()
        .map(RecipeSummary::from)
        .collect();

    Ok(Json(recipes))
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecipePayload>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::BadRequest)?;

    let recipe = state.recipe_repository.create(user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let recipe = state
        .recipe_repository
        .get_for_user(user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

/// Full update; omitted optional fields are reset and tags are replaced
pub async fn replace_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipePayload>,
) -> ApiResult<impl IntoResponse> {
    payload.validate().map_err(ApiError::BadRequest)?;
    apply_update(&state, &user, id, RecipePatch::from(payload)).await
}

/// Partial update
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RecipePatch>,
) -> ApiResult<impl IntoResponse> {
    patch.validate().map_err(ApiError::BadRequest)?;
    apply_update(&state, &user, id, patch).await
}

async fn apply_update(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    patch: RecipePatch,
) -> ApiResult<Json<Recipe>> {
    let recipe = state
        .recipe_repository
        .update(user.id, id, &patch)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.recipe_repository.delete(user.id, id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted recipe {} for user {}", id, user.id);
    Ok(StatusCode::NO_CONTENT)
}
