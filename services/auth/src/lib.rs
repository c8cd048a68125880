//! User service: accounts keyed by email, password login and JWT issuing

pub mod email;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod validation;

use common::cache::RedisPool;

use crate::{
    jwt::JwtService, rate_limiter::RateLimiter, repositories::UserManager,
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_manager: UserManager,
    pub jwt_service: JwtService,
    pub sessions: SessionManager,
    pub redis_pool: RedisPool,
    pub rate_limiter: RateLimiter,
}
