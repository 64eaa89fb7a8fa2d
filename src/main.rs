use anyhow::{Context, Result};
use pantry::api::{self, AppState};
use pantry::config::{AppConfig, LogFormat};
use pantry::db::{self, PgStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    info!("Starting pantry service");

    let state = match &config.database {
        Some(database) => {
            let pool = db::connect_with_retry(database).await?;
            db::init_database_schema(&pool).await?;
            let store = Arc::new(PgStore::new(pool));
            AppState::new(store.clone(), store)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory stores");
            AppState::in_memory()
        }
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_addr))?;
    info!(addr = %config.server_addr, "Server started");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
