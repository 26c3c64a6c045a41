use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tsorders_api::{
    app,
    state::{AppState, AuthConfig, ServiceInfo},
};
use tsorders_core::{CarrierGateway, OrderRepository};
use tsorders_gls::GlsClient;
use tsorders_store::{Config, DbClient, StoreOrderRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load config")?;

    let log_file = match config.logging.file.as_deref().filter(|path| !path.is_empty()) {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?,
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        }))
        .init();

    tracing::info!(
        version = %config.app.version,
        environment = %config.app.environment,
        "Starting {}",
        config.app.name
    );

    let db = DbClient::new(&config.database);
    let repo: Arc<dyn OrderRepository> = Arc::new(StoreOrderRepository::new(db.pool.clone()));
    match repo.ping().await {
        Ok(()) => tracing::info!("Database connection verified"),
        Err(e) => tracing::error!(error = %e, "Database connection failed - check configuration"),
    }
    let carrier: Arc<dyn CarrierGateway> =
        Arc::new(GlsClient::new(config.gls.clone()).context("Failed to build GLS client")?);

    let app_state = AppState::new(
        repo,
        carrier,
        AuthConfig::from_settings(&config.auth)?,
        ServiceInfo::from(&config.app),
        config.cors.origins.clone(),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down {}", config.app.name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
