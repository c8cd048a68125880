//! Redis cache module
//!
//! Holds short-lived authentication state (refresh-token sessions and the
//! token blacklist). Every key is namespaced with a configurable prefix so
//! several deployments can share one Redis instance.

use anyhow::Result;
use redis::{AsyncCommands, Client, Script};
use tracing::info;

const DELETE_IF_EQUALS: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key, separated by `:`
    pub key_prefix: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX`: Key namespace (default: "recipe_app")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix =
            std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "recipe_app".to_string());

        Ok(RedisConfig { url, key_prefix })
    }
}

/// Multiplexed Redis client
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    key_prefix: String,
}

impl RedisPool {
    /// Open a Redis client. No connection is made until the first command.
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key-value pair with optional TTL in seconds
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key = self.namespaced(key);

        match ttl_seconds {
            // SETEX rejects a zero TTL; the entry would expire immediately anyway
            Some(0) => {}
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let found: bool = conn.exists(self.namespaced(key)).await?;
        Ok(found)
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.namespaced(key)).await?;
        Ok(())
    }

    /// Delete `key` only while it still holds `expected`, in one round trip.
    /// Returns whether this call removed it.
    pub async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let script = Script::new(DELETE_IF_EQUALS);
        let deleted: i64 = script
            .key(self.namespaced(key))
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config(prefix: &str) -> RedisConfig {
        RedisConfig {
            url: "redis://localhost:6379".to_string(),
            key_prefix: prefix.to_string(),
        }
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() -> Result<()> {
        let pool = RedisPool::new(&local_config("recipe_app")).await?;
        assert_eq!(pool.namespaced("session:42"), "recipe_app:session:42");

        let bare = RedisPool::new(&local_config("")).await?;
        assert_eq!(bare.namespaced("session:42"), "session:42");
        Ok(())
    }

    #[tokio::test]
    async fn test_new_rejects_malformed_url() {
        let config = RedisConfig {
            url: "not-a-redis-url".to_string(),
            key_prefix: String::new(),
        };

        assert!(RedisPool::new(&config).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_set_get_delete() -> Result<()> {
        let pool = RedisPool::new(&local_config("recipe_app_test")).await?;
        assert!(pool.health_check().await?);

        pool.set("key", "value", Some(5)).await?;
        assert_eq!(pool.get("key").await?, Some("value".to_string()));
        assert!(pool.exists("key").await?);

        pool.delete("key").await?;
        assert_eq!(pool.get("key").await?, None);
        assert!(!pool.exists("key").await?);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_delete_if_equals_only_once() -> Result<()> {
        let pool = RedisPool::new(&local_config("recipe_app_test")).await?;
        pool.set("cas", "current", Some(5)).await?;

        assert!(!pool.delete_if_equals("cas", "stale").await?);
        assert!(pool.exists("cas").await?);

        assert!(pool.delete_if_equals("cas", "current").await?);
        assert!(!pool.delete_if_equals("cas", "current").await?);
        assert!(!pool.exists("cas").await?);

        Ok(())
    }
}
