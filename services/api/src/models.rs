//! API models for request and response payloads

pub mod price;
pub mod recipe;
pub mod tag;

pub use price::{Price, PriceError};
pub use recipe::{Recipe, RecipePatch, RecipePayload, RecipeQuery, RecipeSummary};
pub use tag::{Tag, TagPatch, TagPayload, TagQuery};
