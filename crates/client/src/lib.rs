//! Client code for mdscrape.
//!
//! This crate provides the render pipeline (headless browser, readability
//! extraction, Markdown conversion, chunking) and the [`ScrapeService`] that
//! ties it to the cache and the request deadline.

pub mod chunk;
pub mod extract;
pub mod render;
pub mod service;
pub mod target;

pub use chunk::{DEFAULT_CHUNK_SIZE, chunk_markdown};
pub use extract::{
    ExtractConfig, Extraction, Extractor, LectitoExtractor, extract_readable, html_to_markdown, normalize_markdown,
    sanitize_html,
};
pub use render::{BrowserSession, HeadlessRenderer, LaunchOptions, RenderError, RenderOptions, RenderedPage, Renderer};
pub use service::{ScrapeOptions, ScrapeService, ServiceConfig};
pub use target::{UrlError, validate_url};
