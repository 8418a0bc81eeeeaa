use tokio::signal;
use tokio::sync::oneshot;

/// Resolves on Ctrl+C, SIGTERM, or a model load failure.
pub async fn shutdown_signal(load_failure: oneshot::Receiver<String>) {
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

    let failed = async {
        match load_failure.await {
            Ok(reason) => reason,
            // Sender dropped: the model loaded, keep serving.
            Err(_) => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        reason = failed => {
            tracing::error!(reason = %reason, "Model load failed, shutting down");
        }
    }
}
