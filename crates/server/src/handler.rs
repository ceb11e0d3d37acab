//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{WebScrapeParams, scrape_impl};

use mdscrape_client::ScrapeService;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mdscrape.
#[derive(Clone)]
pub struct ScrapeServer {
    service: Arc<ScrapeService>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ScrapeServer {
    pub fn new(service: Arc<ScrapeService>) -> Self {
        Self { service, tool_router: Self::tool_router() }
    }

    /// Render a page and return its main content as Markdown.
    ///
    /// Pages are rendered in a headless browser so client-side content is
    /// included. Results are cached per URL for the configured TTL.
    #[tool(
        description = "Render a web page in a headless browser and return its main content as Markdown. Set chunks=true to receive fixed-size chunks instead."
    )]
    async fn web_scrape(&self, params: Parameters<WebScrapeParams>) -> Result<CallToolResult, McpError> {
        scrape_impl(&self.service, params.0).await
    }
}

impl ServerHandler for ScrapeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mdscrape".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some("Use web_scrape to fetch a rendered page as Markdown.".into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
