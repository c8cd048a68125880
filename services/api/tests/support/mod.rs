//! Shared setup for the database-backed API tests
//!
//! Run against a disposable PostgreSQL database:
//! `DATABASE_URL=... cargo test -p api -- --ignored`

use std::time::{SystemTime, UNIX_EPOCH};

use api::{
    AppState,
    middleware::{Claims, JwtConfig, TokenType, TokenVerifier},
    repositories::{RecipeRepository, TagRepository},
    routes::create_router,
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const PRIVATE_KEY: &str = include_str!("../../../../testdata/jwt_private.pem");
const PUBLIC_KEY: &str = include_str!("../../../../testdata/jwt_public.pem");

pub async fn setup() -> (Router, PgPool) {
    let pool = init_pool(&DatabaseConfig::from_env().unwrap())
        .await
        .expect("PostgreSQL must be reachable through DATABASE_URL");
    run_migrations(&pool).await.unwrap();

    let state = AppState {
        tag_repository: TagRepository::new(pool.clone()),
        recipe_repository: RecipeRepository::new(pool.clone()),
        token_verifier: TokenVerifier::new(&JwtConfig {
            public_key: PUBLIC_KEY.to_string(),
        })
        .unwrap(),
    };

    (create_router(state), pool)
}

/// Insert a user directly; returns its id and an access token for it
pub async fn create_user(pool: &PgPool) -> (Uuid, String) {
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash) VALUES ($1, '!') RETURNING id",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap();

    (id, access_token(id, &email))
}

fn access_token(user_id: Uuid, email: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        is_staff: false,
        iat: now,
        exp: now + 900,
        token_type: TokenType::Access,
    };

    jsonwebtoken::encode(
        &Header::new(jsonwebtoken::Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// Send one request; an empty response body is returned as `Value::Null`
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect()
}
