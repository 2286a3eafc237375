//! scalpel — grounded question answering over surgical textbooks.
//!
//! Run with: cargo run -p scalpel-web

use std::sync::Arc;

use anyhow::Context;
use scalpel_corpus::CorpusStore;
use scalpel_llm::build_backend;
use scalpel_rag::Pipeline;
use scalpel_web::config::{self, Config};
use scalpel_web::router::build_router;
use scalpel_web::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scalpel=debug,info")),
        )
        .init();

    info!("scalpel starting up, version {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        embedding_model = %config.embedding.model,
        corpora = config.corpora.len(),
        "configuration loaded"
    );

    // A missing file or a record/vector mismatch is fatal.
    let store = CorpusStore::load(&config.corpora).context("loading corpora")?;
    let store = Arc::new(store);

    let completion = build_backend(config.completion_backend(config::process_env))
        .context("building completion backend")?;
    let embedding = build_backend(config.embedding_backend(config::process_env))
        .context("building embedding backend")?;

    let pipeline = Pipeline::new(store, completion, embedding, config.pipeline_config());
    let app = build_router(AppState::new(pipeline));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
