//! mdscrape server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use mdscrape_client::{BrowserSession, HeadlessRenderer, LaunchOptions, ScrapeService, ServiceConfig};
use mdscrape_core::{AppConfig, ResultCache};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        navigation = ?config.navigation,
        deadline_ms = config.request_timeout_ms,
        cache_capacity = config.cache_capacity,
        "Starting mdscrape server on stdio transport"
    );

    let session = Arc::new(BrowserSession::new(LaunchOptions::from_app_config(&config)));
    let renderer = Arc::new(HeadlessRenderer::new(Arc::clone(&session)));
    let cache = Arc::new(ResultCache::new(config.cache_capacity, config.cache_ttl()));
    let service = Arc::new(ScrapeService::new(renderer, cache, ServiceConfig::from_app_config(&config)));

    let server = serve_server(handler::ScrapeServer::new(service), stdio()).await?;

    tokio::select! {
        result = server.waiting() => {
            if let Err(e) = result {
                tracing::warn!("server task ended with error: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received Ctrl-C, shutting down");
        }
    }

    session.shutdown().await;

    Ok(())
}
