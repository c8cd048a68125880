//! Repositories for database operations

pub mod recipe;
pub mod tag;

pub use recipe::RecipeRepository;
pub use tag::TagRepository;
