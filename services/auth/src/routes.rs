//! User service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    AppState,
    email::normalize_email,
    error::{AuthError, AuthResult},
    jwt::TokenType,
    middleware::{AuthUser, auth_middleware},
    models::{ExtraFields, LoginCredentials, UpdateUser, UserResponse},
    validation::{validate_email, validate_name, validate_password},
};

/// Response for token generation
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request for user registration
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Create the router for the user service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/user/me/", get(get_me).patch(update_me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/user/create/", post(create_user))
        .route("/user/token/", post(login))
        .route("/user/token/refresh/", post(refresh_token))
        .route("/user/logout/", post(logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "user-service"
    }))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AuthResult<impl IntoResponse> {
    validate_email(&payload.email).map_err(AuthError::BadRequest)?;
    validate_password(&payload.password).map_err(AuthError::BadRequest)?;
    validate_name(&payload.name).map_err(AuthError::BadRequest)?;

    let user = state
        .user_manager
        .create_user(
            &payload.email,
            Some(&payload.password),
            ExtraFields::with_name(payload.name),
        )
        .await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Exchange email and password for a token pair
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> AuthResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    info!("Login attempt for user: {}", email);

    if !state.rate_limiter.is_allowed(&email).await {
        return Err(AuthError::TooManyRequests);
    }

    let user = state
        .user_manager
        .authenticate(&email, &payload.password)
        .await?
        .ok_or_else(|| {
            AuthError::BadRequest("Unable to authenticate with provided credentials".to_string())
        })?;

    state.rate_limiter.reset(&email).await;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            AuthError::InternalServerError
        })?;

    state
        .sessions
        .store(user.id, &refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to store session in Redis: {}", e);
            AuthError::InternalServerError
        })?;

    let response = TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Trade a refresh token for a new access token and a rotated refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Token refresh request");

    let claims = state
        .jwt_service
        .validate_typed(&payload.refresh_token, TokenType::Refresh)
        .map_err(|_| AuthError::Unauthorized)?;

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to check if token is blacklisted: {}", e);
            AuthError::InternalServerError
        })?;

    if is_blacklisted {
        return Err(AuthError::Unauthorized);
    }

    // Consumed atomically so a token cannot be rotated twice
    let claimed = state
        .sessions
        .claim(claims.sub, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to claim session in Redis: {}", e);
            AuthError::InternalServerError
        })?;

    if !claimed {
        return Err(AuthError::Unauthorized);
    }

    let user = state
        .user_manager
        .find_by_id(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AuthError::Unauthorized)?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let new_refresh_token = state
        .jwt_service
        .rotate_refresh_token(&state.redis_pool, &user, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to rotate refresh token: {}", e);
            AuthError::InternalServerError
        })?;

    state
        .sessions
        .store(user.id, &new_refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to update session in Redis: {}", e);
            AuthError::InternalServerError
        })?;

    let response = TokenResponse {
        access_token,
        refresh_token: new_refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Revoke a refresh token and end the session
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    let claims = state
        .jwt_service
        .validate_typed(&payload.refresh_token, TokenType::Refresh)
        .map_err(|_| AuthError::Unauthorized)?;

    info!("Logout request for user: {}", claims.sub);

    state
        .jwt_service
        .blacklist_token(&state.redis_pool, &claims, &payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to blacklist token: {}", e);
            AuthError::InternalServerError
        })?;

    state.sessions.delete(claims.sub).await.map_err(|e| {
        error!("Failed to remove session from Redis: {}", e);
        AuthError::InternalServerError
    })?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

/// Current user's profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AuthResult<Json<UserResponse>> {
    let user = state
        .user_manager
        .find_by_id(auth.id)
        .await?
        .ok_or(AuthError::NotFound)?;

    Ok(Json(UserResponse::from(user)))
}

/// Partially update the current user's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateUser>,
) -> AuthResult<Json<UserResponse>> {
    if let Some(email) = payload.email.as_deref() {
        validate_email(email).map_err(AuthError::BadRequest)?;
    }
    if let Some(name) = payload.name.as_deref() {
        validate_name(name).map_err(AuthError::BadRequest)?;
    }
    if let Some(password) = payload.password.as_deref() {
        validate_password(password).map_err(AuthError::BadRequest)?;
    }

    let user = state
        .user_manager
        .update(auth.id, &payload)
        .await?
        .ok_or(AuthError::NotFound)?;

    info!("Updated profile of user {}", user.id);
    Ok(Json(UserResponse::from(user)))
}
