//! Login throttling to slow down password guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed within a window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        }
    }
}

#[derive(Debug)]
struct Attempts {
    count: u32,
    window_started: Instant,
    banned_until: Option<Instant>,
}

/// In-memory rate limiter keyed by an arbitrary string (the login email)
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, Attempts>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if !entries.contains_key(key) {
            self.prune(&mut entries, now);
        }

        let entry = entries.entry(key.to_string()).or_insert(Attempts {
            count: 0,
            window_started: now,
            banned_until: None,
        });

        if let Some(banned_until) = entry.banned_until {
            if now < banned_until {
                return false;
            }
            entry.banned_until = None;
            entry.count = 0;
            entry.window_started = now;
        }

        let window = Duration::from_secs(self.config.window_seconds);
        if now.duration_since(entry.window_started) >= window {
            entry.count = 0;
            entry.window_started = now;
        }

        if entry.count >= self.config.max_attempts {
            entry.banned_until = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Throttled logins for {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.count += 1;
        true
    }

    /// Drop entries whose window and ban have both lapsed
    fn prune(&self, entries: &mut HashMap<String, Attempts>, now: Instant) {
        let window = Duration::from_secs(self.config.window_seconds);
        entries.retain(|_, attempts| {
            let banned = attempts.banned_until.is_some_and(|until| now < until);
            banned || now.duration_since(attempts.window_started) < window
        });
    }

    /// Forget the attempts recorded for `key` after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}
