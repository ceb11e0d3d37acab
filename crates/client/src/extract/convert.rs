//! HTML to Markdown conversion.

use htmd::HtmlToMarkdown;
use htmd::options::{HeadingStyle, Options};
use mdscrape_core::Error;

/// Elements dropped together with their content during conversion.
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Convert an HTML fragment or document to Markdown with `#`-prefixed headings.
///
/// The result is raw converter output; run it through
/// [`normalize_markdown`](super::normalize_markdown) before use.
pub fn html_to_markdown(html: &str) -> Result<String, Error> {
    let converter = HtmlToMarkdown::builder()
        .options(Options { heading_style: HeadingStyle::Atx, ..Default::default() })
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    converter
        .convert(html)
        .map_err(|e| Error::PipelineFailure(format!("markdown conversion failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::normalize_markdown;

    #[test]
    fn test_atx_headings() {
        let md = html_to_markdown("<h1>Title</h1><h2>Section</h2><p>Body</p>").unwrap();
        assert!(md.contains("# Title"));
        assert!(md.contains("## Section"));
        assert!(!md.contains("====="));
    }

    #[test]
    fn test_head_and_scripts_skipped() {
        let html = "<html><head><title>Tab title</title></head><body><script>var x = 1;</script><p>Visible</p></body></html>";
        let md = html_to_markdown(html).unwrap();
        assert!(!md.contains("Tab title"));
        assert!(!md.contains("var x"));
        assert!(md.contains("Visible"));
    }

    #[test]
    fn test_simple_page_normalized() {
        let html = "<html><body><h1>Title</h1><p>Hello   world.</p></body></html>";
        let md = normalize_markdown(&html_to_markdown(html).unwrap());
        assert_eq!(md, "# Title\n\nHello world.");
    }

    #[test]
    fn test_links_preserved() {
        let md = html_to_markdown(r#"<p>See <a href="https://example.com/docs">the docs</a>.</p>"#).unwrap();
        assert!(md.contains("[the docs](https://example.com/docs)"));
    }
}
