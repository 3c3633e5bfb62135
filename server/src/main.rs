use std::net::SocketAddr;

use server::{build_router, config::ServerConfig, metrics, model, AppState};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting TTS server...");
    metrics::mark_start();

    let config = ServerConfig::from_env();
    info!(
        "Server configuration loaded: port={}, voices_dir={}, staging_dir={}, device={}",
        config.port,
        config.voices_dir.display(),
        config.staging_dir.display(),
        config.device
    );

    // The listener comes up right away; /generate answers NotReady until the
    // model is in.
    let slot = model::ModelSlot::empty();
    model::spawn_model_loader(slot.clone(), config.clone());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let app = build_router(AppState::new(config, slot));

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT.")
    })?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
