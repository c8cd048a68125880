//! Recipe service: tags and recipes owned by the authenticated user
//!
//! Requests are authenticated with access tokens issued by the user service.

pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;
