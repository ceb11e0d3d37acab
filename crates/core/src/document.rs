//! Output data model: normalized Markdown documents and their chunks.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A normalized Markdown rendering of one page. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownDocument {
    /// The URL exactly as requested.
    pub url: String,
    pub markdown: String,
    /// Whether the readable-content extractor gave up and the full page was used.
    pub fallback: bool,
    pub fetched_at: DateTime<Utc>,
}

/// One contiguous, non-overlapping slice of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chunk {
    /// 1-based, strictly increasing.
    pub id: usize,
    pub text: String,
}

/// What a scrape returns to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScrapeOutput {
    Markdown { url: String, markdown: String },
    Chunks { url: String, chunks: Vec<Chunk> },
}

impl ScrapeOutput {
    pub fn url(&self) -> &str {
        match self {
            ScrapeOutput::Markdown { url, .. } | ScrapeOutput::Chunks { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_output_shape() {
        let output = ScrapeOutput::Markdown { url: "https://example.com/".into(), markdown: "# Hi".into() };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json, serde_json::json!({ "url": "https://example.com/", "markdown": "# Hi" }));
    }

    #[test]
    fn test_chunks_output_shape() {
        let output = ScrapeOutput::Chunks {
            url: "https://example.com/".into(),
            chunks: vec![Chunk { id: 1, text: "ab".into() }, Chunk { id: 2, text: "c".into() }],
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "url": "https://example.com/",
                "chunks": [{ "id": 1, "text": "ab" }, { "id": 2, "text": "c" }]
            })
        );
        assert_eq!(output.url(), "https://example.com/");
    }
}
