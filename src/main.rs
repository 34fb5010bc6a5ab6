//! kv-gateway server entry point.
//!
//! Loads configuration, verifies the store, and serves the WebSocket
//! endpoint until Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use kv_gateway::api;
use kv_gateway::app_state::AppState;
use kv_gateway::config::{GatewayConfig, LogFormat};
use kv_gateway::error::StartupError;
use kv_gateway::store::{PostgresBackend, StoreClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = GatewayConfig::from_env().context("loading configuration")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, ws_path = %config.ws_path, "starting kv-gateway");

    let store = connect_store(&config).await.context("connecting to store")?;

    let app_state = AppState::new(store.clone(), config.allowed_origins.clone());
    let app = api::build_app(app_state, &config.ws_path);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(StartupError::Io)
        .context("binding listener")?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    store.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn connect_store(config: &GatewayConfig) -> Result<StoreClient, StartupError> {
    let backend = PostgresBackend::connect(config).await?;
    if config.run_migrations {
        backend.migrate().await?;
    }
    StoreClient::open(Arc::new(backend)).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received; no longer accepting connections");
}
