//! Process bootstrap shared by `duet-embed` and `duet-rerank`.

use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::embedding::ServedModel;
use crate::gateway::{HandlerState, RequestLimits};
use crate::lifecycle::{ModelCell, ModelStatus, shutdown_signal, spawn_model_loader};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Installs the global `tracing` subscriber (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Binds the listener, loads the model in the background and serves until shutdown.
///
/// Returns an error if the model fails to load, after the listener has drained.
pub async fn serve<M, F, E>(
    config: Config,
    service: &'static str,
    load: F,
    build_router: fn(HandlerState<M>, usize) -> Router,
) -> anyhow::Result<()>
where
    M: ServedModel,
    F: FnOnce() -> Result<M, E> + Send + 'static,
    E: Display + Send + 'static,
{
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.socket_addr()))?;

    let cell = Arc::new(ModelCell::loading());
    let state = HandlerState::new(Arc::clone(&cell), RequestLimits::from_config(&config));
    let app = build_router(state, config.max_body_bytes);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %addr, service, "Server listening");

    let load_failure = spawn_model_loader(Arc::clone(&cell), load);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(load_failure))
        .await?;

    if let ModelStatus::Failed { reason } = cell.status() {
        anyhow::bail!("{} model failed to load: {}", service, reason);
    }

    tracing::info!(service, "Shutdown complete");
    Ok(())
}

/// Checks the local `/healthz`; returns the process exit code (0 healthy, 1 otherwise).
pub async fn run_health_check() -> i32 {
    check_health(Config::port_from_env()).await
}

async fn check_health(port: u16) -> i32 {
    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(client) = reqwest::Client::builder()
        .timeout(HEALTH_CHECK_TIMEOUT)
        .build()
    else {
        return 1;
    };

    match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => 0,
        Ok(res) => {
            tracing::debug!(status = %res.status(), "Health check failed");
            1
        }
        Err(e) => {
            tracing::debug!(error = %e, "Health check request failed");
            1
        }
    }
}
