//! HTTP server settings loaded with the `config` crate

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Address a service binds its HTTP listener to
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load settings from `<PREFIX>_HOST` / `<PREFIX>_PORT`, falling back to
    /// `0.0.0.0:<default_port>`
    pub fn from_env(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
