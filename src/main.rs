use anyhow::Context;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod auth;
mod config;
mod error;
mod github;
mod gravatar;
mod model;
mod routes;
mod service;
mod state;
mod store;

use auth::Credentials;
use config::Config;
use github::GithubClient;
use state::AppState;
use store::Stores;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let stores = match &config.database_url {
        Some(database_url) => {
            // Connect to PostgreSQL
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            info!("🗄️ Connected to Postgres");
            Stores::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set, data is kept in memory only");
            Stores::in_memory()
        }
    };

    let github = GithubClient::new(
        config.github_api_url.clone(),
        config.github_client_id.clone(),
        config.github_secret.clone(),
    )?;
    let credentials = Credentials::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
    let state = AppState::new(stores, credentials, github);

    let app = routes::app(state, Some(&config.static_dir));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("🚀 Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
