//! Cross-encoder reranking service entrypoint.

use mimalloc::MiMalloc;

use duet::config::Config;
use duet::embedding::{Reranker, RerankerConfig};
use duet::gateway::create_rerank_router;
use duet::server::{init_tracing, run_health_check, serve};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }

    init_tracing();

    let config = Config::from_env()?;
    config.validate()?;

    let reranker_config = RerankerConfig::from_server_config(&config)?;
    if reranker_config.model_path.is_none() {
        tracing::warn!("No DUET_MODEL_PATH configured, running reranker in stub mode");
    }

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        activation = ?reranker_config.activation,
        "duet-rerank starting"
    );

    serve(
        config,
        "rerank",
        move || Reranker::load(reranker_config),
        create_rerank_router::<Reranker>,
    )
    .await
}
