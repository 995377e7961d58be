//! ekey Server - webhook bridge for ekey bionyx fingerprint controllers
//!
//! Exposes the bridge via HTTP endpoints:
//! - POST /api/notification/finger - Receive a fingerprint event (also POST /)
//! - GET|PUT|DELETE /api/mapping - Manage the id-to-name mapping
//! - GET /api/states - Per-user sensor states

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use ekey_server::{create_router_with_config, spawn_logger, AppState, Bridge, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ekey_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();

    let mapping = config
        .initial_mapping()
        .context("Invalid mapping configuration")?;
    if mapping.is_empty() {
        tracing::info!("No mapping configured - using raw IDs");
    } else {
        let summary = mapping.summary();
        tracing::info!(
            system = %summary.system,
            users = summary.users,
            devices = summary.devices,
            "Mapping loaded"
        );
    }

    let state = AppState::from_config(&config, mapping);
    let _bus_logger = spawn_logger(state.bus());

    #[cfg(unix)]
    if let Some(path) = config.mapping_file.clone() {
        spawn_reload_on_sighup(state.bridge.clone(), path);
    }

    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    tracing::info!("ekey bridge listening on http://{}", addr);
    tracing::info!(
        "Webhook URL: http://{}/api/notification/finger (body limit: {}KB, timeout: {}s)",
        addr,
        config.body_limit_kb,
        config.timeout_secs
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

/// Reload the mapping file whenever the process receives SIGHUP.
#[cfg(unix)]
fn spawn_reload_on_sighup(bridge: Arc<Bridge>, path: std::path::PathBuf) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to install SIGHUP handler: {}", e);
                return;
            }
        };

        while sighup.recv().await.is_some() {
            tracing::info!(path = %path.display(), "SIGHUP received, reloading mapping");
            if let Err(e) = bridge.reload_from_file(&path).await {
                tracing::error!(error = %e, "Mapping reload failed, keeping current mapping");
            }
        }
    });
}
