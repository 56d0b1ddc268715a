use std::sync::Arc;

use anyhow::Context;

use bookshelf_auth::Hs256TokenVerifier;
use bookshelf_infra::{Config, PostgresBookStore, PostgresUserStore, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environments set variables directly.
    dotenvy::dotenv().ok();

    bookshelf_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting bookshelf-api");

    let pool = store::connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    store::ensure_schema(&pool)
        .await
        .context("failed to prepare database schema")?;

    let state = bookshelf_api::app::AppState::new(
        Arc::new(PostgresBookStore::new(pool.clone())),
        Arc::new(PostgresUserStore::new(pool)),
        Arc::new(Hs256TokenVerifier::new(&config.jwt_secret)),
    );
    let app = bookshelf_api::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind 0.0.0.0:{}", config.port))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
