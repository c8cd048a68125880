//! Database access for the user service

pub mod user;

pub use user::{UserError, UserManager};
