//! Application state shared across handlers

use crate::{
    middleware::TokenVerifier,
    repositories::{RecipeRepository, TagRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tag_repository: TagRepository,
    pub recipe_repository: RecipeRepository,
    pub token_verifier: TokenVerifier,
}
