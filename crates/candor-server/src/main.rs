mod config;
mod seed;

use std::sync::Arc;

use tracing::info;

use candor_api::{AppState, AppStateInner};
use candor_core::Tracker;
use candor_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "candor=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let tracker = Tracker::new(db);

    if config.seed {
        let tracker = tracker.clone();
        tokio::task::spawn_blocking(move || seed::seed(&tracker)).await??;
    }

    let state: AppState = Arc::new(AppStateInner {
        tracker,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl(),
    });
    let app = candor_api::router(state);

    let addr = config.addr()?;
    info!("Candor server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
