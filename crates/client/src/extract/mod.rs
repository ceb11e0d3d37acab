//! Readable content extraction using Lectito.
//!
//! ### Ordering
//! - Sanitize first: scripts, embedded frames, inline handlers and script
//!   URLs are removed before anything else sees the markup.
//! - Extract second: Lectito's Readability-style scoring (text density,
//!   tag semantics, link density) picks the main article.
//! - Convert and normalize last (see [`html_to_markdown`], [`normalize_markdown`]).
//!
//! ### Fallback
//! - Extraction never fails. If Lectito errors or its article is shorter than
//!   `min_content_chars` visible characters, the sanitized full document is
//!   used instead and the result is tagged [`Extraction::Fallback`].

pub mod convert;
pub mod normalize;
pub mod sanitize;

pub use convert::html_to_markdown;
pub use normalize::normalize_markdown;
pub use sanitize::sanitize_html;

use lectito_core::{Document, ExtractConfig as LectitoConfig};
use mdscrape_core::AppConfig;

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum character count Lectito requires per candidate (default: 200)
    pub char_threshold: Option<usize>,

    /// Maximum number of top candidates to consider (default: 5)
    pub max_top_candidates: Option<usize>,

    /// Extracted articles with fewer visible characters fall back to the full page (default: 200)
    pub min_content_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { char_threshold: Some(200), max_top_candidates: Some(5), min_content_chars: 200 }
    }
}

impl ExtractConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self { min_content_chars: config.min_content_chars, ..Default::default() }
    }

    /// Convert to Lectito's config type.
    fn to_lectito_config(&self) -> LectitoConfig {
        let mut cfg = LectitoConfig::default();
        if let Some(threshold) = self.char_threshold {
            cfg.char_threshold = threshold;
        }
        if let Some(max) = self.max_top_candidates {
            cfg.max_top_candidates = max;
        }
        cfg
    }
}

/// Outcome of main-content extraction. Callers only need [`Extraction::html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The main article, as an HTML fragment.
    Extracted(String),
    /// The sanitized full document, used when no article could be isolated.
    Fallback(String),
}

impl Extraction {
    pub fn html(&self) -> &str {
        match self {
            Extraction::Extracted(html) | Extraction::Fallback(html) => html,
        }
    }

    pub fn into_html(self) -> String {
        match self {
            Extraction::Extracted(html) | Extraction::Fallback(html) => html,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback(_))
    }
}

/// Stable extractor trait for content extraction.
///
/// This allows swapping the extraction engine without touching the pipeline.
pub trait Extractor: Send + Sync {
    /// Sanitize `html` and isolate its main content. Never fails.
    fn extract(&self, html: &str, config: &ExtractConfig) -> Extraction;
}

/// Lectito-based extractor implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LectitoExtractor;

impl LectitoExtractor {
    /// Create a new Lectito extractor.
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for LectitoExtractor {
    fn extract(&self, html: &str, config: &ExtractConfig) -> Extraction {
        let sanitized = sanitize_html(html);

        let doc = match Document::parse(&sanitized) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!("readability parse failed, using full page: {e}");
                return Extraction::Fallback(sanitized);
            }
        };

        let article = match lectito_core::extract_content(&doc, &config.to_lectito_config()) {
            Ok(extracted) => extracted.content.to_string(),
            Err(e) => {
                tracing::debug!("readability extraction failed, using full page: {e}");
                return Extraction::Fallback(sanitized);
            }
        };

        let visible = visible_chars(&article);
        if visible < config.min_content_chars {
            tracing::debug!(visible, min = config.min_content_chars, "extracted article too short, using full page");
            return Extraction::Fallback(sanitized);
        }

        Extraction::Extracted(article)
    }
}

/// Count non-whitespace text characters in an HTML fragment.
fn visible_chars(html: &str) -> usize {
    scraper::Html::parse_fragment(html)
        .root_element()
        .text()
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .count()
}

/// Extract readable content from HTML using the default extractor.
///
/// This is a convenience function that uses the Lectito extractor.
pub fn extract_readable(html: &str) -> Extraction {
    LectitoExtractor::new().extract(html, &ExtractConfig::default())
}
