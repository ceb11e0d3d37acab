//! Fixed-size chunking of normalized Markdown.

use mdscrape_core::Chunk;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Split `text` into consecutive windows of `size` characters.
///
/// Every chunk but the last holds exactly `size` characters; the last holds
/// the remainder. Ids start at 1. Empty input yields no chunks, and so does
/// `size == 0`, which callers reject earlier. Sizes count `char`s, so a
/// boundary never lands inside a code point.
pub fn chunk_markdown(text: &str, size: usize) -> Vec<Chunk> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == size {
            chunks.push(Chunk { id: chunks.len() + 1, text: text[start..offset].to_string() });
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(Chunk { id: chunks.len() + 1, text: text[start..].to_string() });

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(chunks: &[Chunk]) -> String {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_markdown("", 10).is_empty());
    }

    #[test]
    fn test_shorter_than_size() {
        let chunks = chunk_markdown("hello", 2000);
        assert_eq!(chunks, vec![Chunk { id: 1, text: "hello".into() }]);
    }

    #[test]
    fn test_exact_multiple() {
        let chunks = chunk_markdown("abcdef", 3);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "abc");
        assert_eq!(chunks[1].text, "def");
    }

    #[test]
    fn test_remainder_in_last_chunk() {
        let chunks = chunk_markdown("abcdefg", 3);
        let ids: Vec<usize> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(chunks[2].text, "g");
    }

    #[test]
    fn test_concatenation_and_count() {
        let text = "# Title\n\nSome paragraph text that goes on for a while.\n\n- a\n- b\n";
        for size in 1..=text.len() + 1 {
            let chunks = chunk_markdown(text, size);
            assert_eq!(rejoin(&chunks), text);
            assert_eq!(chunks.len(), text.chars().count().div_ceil(size));
        }
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "héllo wörld ✓✓✓";
        let chunks = chunk_markdown(text, 4);
        assert_eq!(rejoin(&chunks), text);
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.text.chars().count() == 4));
        assert_eq!(chunks.len(), text.chars().count().div_ceil(4));
    }

    #[test]
    fn test_default_size() {
        let text = "x".repeat(4500);
        let chunks = chunk_markdown(&text, DEFAULT_CHUNK_SIZE);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text.len(), 500);
    }
}
