use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{error, info};

use super::cell::ModelCell;

/// Runs `load` on the blocking pool and settles `cell` with the outcome.
///
/// The returned receiver yields the failure reason if loading fails. It is closed
/// without a value when loading succeeds.
pub fn spawn_model_loader<M, F, E>(cell: Arc<ModelCell<M>>, load: F) -> oneshot::Receiver<String>
where
    M: Send + Sync + 'static,
    F: FnOnce() -> Result<M, E> + Send + 'static,
    E: Display + Send + 'static,
{
    let (failure_tx, failure_rx) = oneshot::channel();

    tokio::spawn(async move {
        let started = Instant::now();
        info!("Loading model...");

        let failure = match tokio::task::spawn_blocking(load).await {
            Ok(Ok(model)) => {
                cell.set_ready(model);
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Model ready"
                );
                None
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(e) => Some(format!("model loader task failed: {}", e)),
        };

        if let Some(reason) = failure {
            error!(reason = %reason, "Model failed to load");
            cell.set_failed(reason.clone());
            let _ = failure_tx.send(reason);
        }
    });

    failure_rx
}
