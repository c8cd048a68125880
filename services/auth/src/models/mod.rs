//! User service models

pub mod user;

pub use user::{ExtraFields, LoginCredentials, UpdateUser, User, UserResponse};
