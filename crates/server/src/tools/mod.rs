//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mdscrape server.

pub mod web_scrape;

pub use web_scrape::{WebScrapeParams, scrape_impl};
