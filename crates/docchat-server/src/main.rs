//! docchat: chat with your documents over HTTP.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use docchat_core::DocChatConfig;
use docchat_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DocChatConfig::from_env()?;
    let port = config.port;
    info!(
        backend = ?config.vector_backend,
        embedding_model = %config.embedding_model,
        generation_model = %config.generation_model,
        "configuration loaded"
    );

    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("docchat server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
