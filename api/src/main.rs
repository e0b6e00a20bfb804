use anyhow::{Context, Result};
use api::{logging, router, AppState};
use shared::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_logging(config.log_format);

    info!("Starting strategy backtester API server...");

    let address = config.bind_address();
    let state = AppState::new(config);
    info!(strategies = ?state.registry.list(), "Registered strategies");

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("API server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down API server...");
}
