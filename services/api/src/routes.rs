//! Recipe service routes

mod recipes;
mod tags;

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use crate::{AppState, middleware::auth_middleware};

/// Create the router for the recipe service
pub fn create_router(state: AppState) -> Router {
    let recipe_routes = Router::new()
        .route("/recipe/tags/", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/recipe/tags/:id/",
            get(tags::get_tag)
                .put(tags::replace_tag)
                .patch(tags::update_tag)
                .delete(tags::delete_tag),
        )
        .route(
            "/recipe/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipe/recipes/:id/",
            get(recipes::get_recipe)
                .put(recipes::replace_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(recipe_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "recipe-service"
    }))
}
