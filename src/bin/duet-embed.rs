//! Instructor embedding service entrypoint.

use mimalloc::MiMalloc;

use duet::config::Config;
use duet::embedding::{InstructorConfig, InstructorEmbedder};
use duet::gateway::create_embed_router;
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

    let embedder_config = InstructorConfig::from_server_config(&config)?;
    if embedder_config.testing_stub {
        tracing::warn!("No DUET_MODEL_PATH configured, running embedder in stub mode");
    }

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        max_batch_size = config.max_batch_size,
        "duet-embed starting"
    );

    serve(
        config,
        "embed",
        move || InstructorEmbedder::load(embedder_config),
        create_embed_router::<InstructorEmbedder>,
    )
    .await
}
