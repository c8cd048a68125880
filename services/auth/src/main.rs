use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use auth::{
    AppState,
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserManager,
    routes,
    session::SessionManager,
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    settings::ServerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting user service");

    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
    let sessions = SessionManager::new(redis_pool.clone(), jwt_service.refresh_token_expiry());
    match sessions.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        _ => warn!("Redis is unreachable; login and refresh will fail until it is up"),
    }

    let app_state = AppState {
        user_manager: UserManager::new(pool),
        jwt_service,
        sessions,
        redis_pool,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    let app = routes::create_router(app_state);

    let server_config = ServerConfig::from_env("AUTH", 3000)?;
    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    info!("User service listening on {}", server_config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
