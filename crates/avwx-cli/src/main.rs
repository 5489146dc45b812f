use std::net::SocketAddr;

use anyhow::{Context, Result};
use avwx_cli::AppOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Observability
    avwx_obs::init("avwxd");

    // Config
    let cfg = match avwx_config::AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error=%e, "config unreadable, using defaults");
            avwx_config::AppConfig::default()
        }
    };
    let http_bind = cfg.http_bind();

    // Build app and state
    let (app, state) = avwx_cli::try_build_app(AppOptions::from(&cfg))?;

    // Start HTTP server
    let addr: SocketAddr = http_bind
        .parse()
        .with_context(|| format!("invalid HTTP bind address {http_bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Mark ready just before serving
    avwx_cli::set_ready(&state, true);

    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
