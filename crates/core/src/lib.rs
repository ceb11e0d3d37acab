//! Core types and shared functionality for mdscrape.
//!
//! This crate provides:
//! - In-memory LRU/TTL result cache
//! - Unified error types
//! - Configuration structures
//! - The Markdown document and chunk model

pub mod cache;
pub mod config;
pub mod document;
pub mod error;

pub use cache::ResultCache;
pub use config::{AppConfig, ConfigError, NavigationPolicy, SnapshotScope};
pub use document::{Chunk, MarkdownDocument, ScrapeOutput};
pub use error::Error;
