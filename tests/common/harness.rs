//! Test server harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use duet::embedding::{InstructorEmbedder, Reranker, ServedModel};
use duet::gateway::{HandlerState, RequestLimits, create_embed_router, create_rerank_router};
use duet::lifecycle::{ModelCell, spawn_model_loader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;
const TEST_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub limits: RequestLimits,
    pub max_body_bytes: usize,
    /// Keeps the model in the loading state for this long before it becomes ready.
    pub load_delay: Option<Duration>,
    /// Makes the background load fail with this reason.
    pub load_error: Option<String>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            limits: RequestLimits::default(),
            max_body_bytes: TEST_BODY_LIMIT,
            load_delay: None,
            load_error: None,
        }
    }
}

impl TestServerConfig {
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    pub fn with_load_error(mut self, reason: impl Into<String>) -> Self {
        self.load_error = Some(reason.into());
        self
    }

    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    load_failure: Option<oneshot::Receiver<String>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Resolves with the failure reason, or `None` once the model has loaded.
    pub async fn load_outcome(&mut self) -> Option<String> {
        match self.load_failure.take() {
            Some(rx) => rx.await.ok(),
            None => None,
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Spawns the embedding service backed by the stub Instructor embedder.
pub async fn spawn_embed_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    spawn_server(
        config,
        || InstructorEmbedder::stub().map_err(|e| e.to_string()),
        create_embed_router::<InstructorEmbedder>,
    )
    .await
}

/// Spawns the reranking service backed by the lexical stub reranker.
pub async fn spawn_rerank_server(
    config: TestServerConfig,
) -> Result<TestServer, ServerStartupError> {
    spawn_server(
        config,
        || Reranker::stub().map_err(|e| e.to_string()),
        create_rerank_router::<Reranker>,
    )
    .await
}

async fn spawn_server<M, F>(
    config: TestServerConfig,
    load: F,
    build_router: fn(HandlerState<M>, usize) -> Router,
) -> Result<TestServer, ServerStartupError>
where
    M: ServedModel,
    F: FnOnce() -> Result<M, String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let local_addr = listener.local_addr()?;

    let cell = Arc::new(ModelCell::loading());
    let state = HandlerState::new(Arc::clone(&cell), config.limits);
    let app = build_router(state, config.max_body_bytes);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    let TestServerConfig {
        load_delay,
        load_error,
        ..
    } = config;

    let load_failure = spawn_model_loader(cell, move || {
        if let Some(delay) = load_delay {
            std::thread::sleep(delay);
        }
        match load_error {
            Some(reason) => Err(reason),
            None => load(),
        }
    });

    Ok(TestServer {
        addr: local_addr,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
        load_failure: Some(load_failure),
    })
}
