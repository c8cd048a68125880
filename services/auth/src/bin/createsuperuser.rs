//! Create an administrator account from the command line

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{models::ExtraFields, repositories::UserManager};
use common::database::{self, DatabaseConfig};

#[derive(Parser, Debug)]
#[command(name = "createsuperuser", about = "Create a staff superuser account")]
struct Args {
    /// Email address used to log in
    #[arg(long, env = "SUPERUSER_EMAIL")]
    email: String,

    /// Initial password
    #[arg(long, env = "SUPERUSER_PASSWORD")]
    password: String,

    /// Display name
    #[arg(long, default_value = "")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let pool = database::init_pool(&DatabaseConfig::from_env()?).await?;
    database::run_migrations(&pool).await?;

    let user = UserManager::new(pool)
        .create_superuser(&args.email, &args.password, ExtraFields::with_name(args.name))
        .await?;

    info!("Superuser {} created with id {}", user.email, user.id);
    Ok(())
}
