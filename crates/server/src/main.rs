use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sectio_core::{MediaWikiClient, Pipeline, SectionsConfig};
use sectio_server::{ServerConfig, create_router, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_tracing(config.log_json);

    let client = MediaWikiClient::new(config.fetch_config()).context("Failed to build HTTP client")?;
    let pipeline = Pipeline::new(Arc::new(client), SectionsConfig::default());
    let app = create_router(pipeline, config.request_timeout());

    let listener = TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.addr()))?;

    tracing::info!(addr = %config.addr(), json_format = config.log_json, "Server initialized");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
