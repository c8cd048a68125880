//! JWT service for token generation, validation, and management
//!
//! Access and refresh tokens are signed with RS256. The recipe service only
//! holds the public key and verifies access tokens; refresh tokens are
//! rotated here and blacklisted in Redis once used or logged out.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;
use common::cache::RedisPool;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

/// Read a PEM key given either inline or as a path to a file
pub(crate) fn load_pem(var: &str) -> Result<String> {
    let value = std::env::var(var)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?;

    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    let contents = std::fs::read_to_string(&value)
        .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", value, e))?;
    Ok(contents.trim().to_string())
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key (PEM) or path to the private key file
    /// - `JWT_PUBLIC_KEY`: Public key (PEM) or path to the public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let private_key = load_pem("JWT_PRIVATE_KEY")?;
        let public_key = load_pem("JWT_PUBLIC_KEY")?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(604800);

        Ok(JwtConfig {
            private_key,
            public_key,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Normalized email of the user
    pub email: String,
    /// Whether the user may use staff-only features
    pub is_staff: bool,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())?;
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    fn issue(&self, user: &User, token_type: TokenType, lifetime: u64) -> Result<String> {
        let now = now_secs()?;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            iat: now,
            exp: now + lifetime,
            token_type,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?;
        Ok(token)
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Access, self.config.access_token_expiry)
    }

    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Refresh, self.config.refresh_token_expiry)
    }

    /// Validate a token's signature and expiry and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a token and require it to be of the given type
    pub fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            anyhow::bail!("Expected a {:?} token", expected);
        }
        Ok(claims)
    }

    pub async fn is_token_blacklisted(&self, redis_pool: &RedisPool, token: &str) -> Result<bool> {
        redis_pool
            .exists(&format!("blacklisted_token:{}", token))
            .await
    }

    /// Blacklist a token for the rest of its lifetime
    pub async fn blacklist_token(
        &self,
        redis_pool: &RedisPool,
        claims: &Claims,
        token: &str,
    ) -> Result<()> {
        let remaining = claims.exp.saturating_sub(now_secs()?);
        redis_pool
            .set(&format!("blacklisted_token:{}", token), "1", Some(remaining))
            .await
    }

    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }

    /// Blacklist the old refresh token and issue a new one for the same user
    pub async fn rotate_refresh_token(
        &self,
        redis_pool: &RedisPool,
        user: &User,
        old_refresh_token: &str,
    ) -> Result<String> {
        let claims = self.validate_typed(old_refresh_token, TokenType::Refresh)?;

        if claims.sub != user.id {
            anyhow::bail!("Token does not belong to user");
        }

        self.blacklist_token(redis_pool, &claims, old_refresh_token)
            .await?;

        self.generate_refresh_token(user)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;

    pub(crate) const TEST_PRIVATE_KEY: &str = include_str!("../../../testdata/jwt_private.pem");
    pub(crate) const TEST_PUBLIC_KEY: &str = include_str!("../../../testdata/jwt_public.pem");

    pub(crate) fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            private_key: TEST_PRIVATE_KEY.to_string(),
            public_key: TEST_PUBLIC_KEY.to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
        .unwrap()
    }

    pub(crate) fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: String::new(),
            password_hash: String::new(),
            is_staff: false,
            is_active: true,
            is_superuser: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_roundtrip_claims() {
        let service = test_service();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_validate_typed_rejects_wrong_type() {
        let service = test_service();
        let refresh = service.generate_refresh_token(&test_user()).unwrap();

        assert!(service.validate_typed(&refresh, TokenType::Refresh).is_ok());
        assert!(service.validate_typed(&refresh, TokenType::Access).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = test_service();
        let token = service.generate_access_token(&test_user()).unwrap();

        let signature_start = token.rfind('.').unwrap() + 1;
        let replacement = if token[signature_start..].starts_with('A') { "B" } else { "A" };
        let mut tampered = token.clone();
        tampered.replace_range(signature_start..signature_start + 1, replacement);

        assert!(service.validate_token(&tampered).is_err());
        assert!(service.validate_token("garbage").is_err());
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env_with_inline_keys() {
        unsafe {
            std::env::set_var("JWT_PRIVATE_KEY", TEST_PRIVATE_KEY);
            std::env::set_var("JWT_PUBLIC_KEY", TEST_PUBLIC_KEY);
            std::env::set_var("JWT_ACCESS_TOKEN_EXPIRY", "60");
            std::env::remove_var("JWT_REFRESH_TOKEN_EXPIRY");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.access_token_expiry, 60);
        assert_eq!(config.refresh_token_expiry, 604800);
        assert!(JwtService::new(config).is_ok());

        unsafe {
            std::env::remove_var("JWT_PRIVATE_KEY");
            std::env::remove_var("JWT_PUBLIC_KEY");
            std::env::remove_var("JWT_ACCESS_TOKEN_EXPIRY");
        }
    }

    #[test]
    #[serial]
    fn test_jwt_config_requires_keys() {
        unsafe {
            std::env::remove_var("JWT_PRIVATE_KEY");
            std::env::remove_var("JWT_PUBLIC_KEY");
        }

        assert!(JwtConfig::from_env().is_err());
    }
}
