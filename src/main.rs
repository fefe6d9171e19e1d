//! Eventus
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use eventus::{config::Settings, router, utils::logging, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", eventus::info());
    info!(
        backend = %settings.backend.base_url,
        identity = %settings.identity.base_url,
        realm = %settings.identity.realm,
        "Upstream services configured"
    );

    let bind_address = settings.bind_address();

    info!("Loading translations and initializing services...");
    let ctx = AppContext::from_settings(settings).await?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!("Eventus listening on {}", bind_address);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Eventus has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
