//! Deterministic Markdown cleanup.
//!
//! Applied to converter output before chunking and caching. The pass is
//! idempotent: `normalize_markdown(&normalize_markdown(s)) == normalize_markdown(s)`.

use std::sync::LazyLock;

use regex::Regex;

/// `[](mailto:...)` / `[](http(s)://...)` left behind by icon-only anchors.
static EMPTY_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\]\((?:mailto:[^)]+|https?://[^)]+)\)").expect("invalid empty-link regex"));

/// Horizontal whitespace immediately before a line break.
static TRAILING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+\n").expect("invalid trailing-ws regex"));

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("invalid newline regex"));

/// Two or more horizontal whitespace characters.
static WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]{2,}").expect("invalid ws-run regex"));

/// Normalize converted Markdown.
///
/// 1. Remove empty links to mail or HTTP(S) targets (repeated, since removing
///    an inner empty link can leave an outer one empty).
/// 2. Strip horizontal whitespace before line breaks.
/// 3. Collapse three or more newlines to a single blank line.
/// 4. Collapse runs of horizontal whitespace to one space.
/// 5. Trim the document.
pub fn normalize_markdown(raw: &str) -> String {
    let mut text = raw.to_string();
    while EMPTY_LINK.is_match(&text) {
        text = EMPTY_LINK.replace_all(&text, "").into_owned();
    }

    let text = TRAILING_WS.replace_all(&text, "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    let text = WS_RUN.replace_all(&text, " ");

    text.trim().to_string()
}
