use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{
    AppState,
    middleware::{JwtConfig, TokenVerifier},
    repositories::{RecipeRepository, TagRepository},
    routes,
};
use common::{
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

    info!("Starting recipe service");

    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    let token_verifier = TokenVerifier::new(&JwtConfig::from_env()?)?;

    let app_state = AppState {
        tag_repository: TagRepository::new(pool.clone()),
        recipe_repository: RecipeRepository::new(pool),
        token_verifier,
    };

    let app = routes::create_router(app_state);

    let server_config = ServerConfig::from_env("API", 3001)?;
    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    info!("Recipe service listening on {}", server_config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}
