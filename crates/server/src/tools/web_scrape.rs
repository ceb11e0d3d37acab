//! web_scrape tool implementation.
//!
//! Renders a URL in the shared headless browser and returns its main content
//! as Markdown, either whole or split into fixed-size chunks.

use mdscrape_client::{ScrapeOptions, ScrapeService};
use mdscrape_core::{Error, ScrapeOutput};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for web_scrape tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebScrapeParams {
    /// Absolute http(s) URL to render.
    pub url: String,

    /// Return `{url, chunks}` instead of `{url, markdown}`.
    #[serde(default)]
    pub chunks: bool,

    /// Chunk size in characters (default: server configuration, 2000).
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl From<&WebScrapeParams> for ScrapeOptions {
    fn from(params: &WebScrapeParams) -> Self {
        Self { chunks: params.chunks, chunk_size: params.chunk_size }
    }
}

/// Implementation of the web_scrape tool.
pub async fn scrape_impl(service: &ScrapeService, params: WebScrapeParams) -> Result<CallToolResult, McpError> {
    let output = service.scrape(&params.url, &ScrapeOptions::from(&params)).await?;
    render_output(&output)
}

fn render_output(output: &ScrapeOutput) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::PipelineFailure(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
