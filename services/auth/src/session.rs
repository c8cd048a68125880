//! Refresh-token sessions stored in Redis
//!
//! A user has at most one live refresh token; logging in again replaces it.

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use common::cache::RedisPool;

/// Session manager for handling user sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

impl SessionManager {
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    /// Store the refresh token for a user, replacing any previous one
    pub async fn store(&self, user_id: Uuid, refresh_token: &str) -> Result<()> {
        info!("Storing session for user: {}", user_id);

        self.redis_pool
            .set(&session_key(user_id), refresh_token, Some(self.ttl_seconds))
            .await
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Option<String>> {
        self.redis_pool.get(&session_key(user_id)).await
    }

    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        info!("Deleting session for user: {}", user_id);

        self.redis_pool.delete(&session_key(user_id)).await
    }

    /// Consume the session if `refresh_token` is the one stored for the user.
    /// Of several concurrent callers with the same token, only one gets `true`.
    pub async fn claim(&self, user_id: Uuid, refresh_token: &str) -> Result<bool> {
        self.redis_pool
            .delete_if_equals(&session_key(user_id), refresh_token)
            .await
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}
