use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::application::routes::app_router;
use crate::application::state::{AppState, AppStateConfig};
use crate::infrastructure::renderer::RendererConfig;

pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub render_key: String,
    pub renderer: RendererConfig,
    pub allow_any_origin: bool,
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    if config.render_key.is_empty() {
        warn!("no render key configured; every /render request will be rejected");
    }

    let title_font = config.renderer.title_font.to_string();
    let subtitle_font = config.renderer.subtitle_font.to_string();

    let state = AppState::new(AppStateConfig {
        renderer: config.renderer,
        render_key: config.render_key,
        allow_any_origin: config.allow_any_origin,
    })
    .context("failed to set up renderer")?;

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    let app = app_router(state);

    info!(
        address = %config.bind_address,
        %title_font,
        %subtitle_font,
        cors = config.allow_any_origin,
        "starting HTTP server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("server shutdown complete");

    Ok(())
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if signal handlers fail
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
