use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ems_portal::api::{api_router, ApiContext};
use ems_portal::config::{self, ServerConfig};
use ems_portal::db;
use ems_portal::llm::OpenAiClient;
use ems_portal::storage::HttpObjectStore;

fn main() {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("EMS portal starting v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Create/migrate the database up front, then drop the writable handle;
    // the pipeline only ever opens read-only connections.
    db::open_database(&config.database)?;
    tracing::info!(path = %config.database.display(), "Reference database ready");

    let llm = Arc::new(OpenAiClient::new(config.llm_config()));
    if !llm.is_configured() {
        tracing::warn!("No LLM API key configured; query endpoints will fail until one is set");
    }
    let store = Arc::new(HttpObjectStore::new(
        &config.storage_key_marker,
        config.fetch_timeout_secs,
    ));

    let ctx = ApiContext::new(
        config.database.clone(),
        llm.clone(),
        store,
        llm.is_configured(),
        llm.key_length(),
    );
    let app = api_router(ctx);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(config.bind).await?;
        tracing::info!(addr = %config.bind, "EMS portal API listening");
        axum::serve(listener, app).await
    })?;

    Ok(())
}
