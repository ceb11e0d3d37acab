//! HTML sanitization.
//!
//! Re-serializes a parsed document, dropping script execution vectors
//! (`<script>`, embedded frames and plugins, inline event handlers,
//! `javascript:` URLs) while keeping every structural and content tag.
//! Parsing is html5ever's error-tolerant algorithm, so malformed markup
//! degrades to a best-effort tree instead of failing.

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html};

/// Elements removed together with their content.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "frame", "frameset", "object", "embed", "applet", "base",
    "link", "meta",
];

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] =
    &["area", "br", "col", "hr", "img", "input", "param", "source", "track", "wbr"];

/// Attributes whose value is a URL and must not carry a script scheme.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "formaction", "poster", "background", "cite", "xlink:href"];

/// Attributes removed regardless of value.
const DROPPED_ATTRIBUTES: &[&str] = &["srcdoc", "style", "formaction"];

/// Nesting beyond this depth is flattened to escaped text.
const MAX_DEPTH: usize = 256;

/// Sanitize an HTML document or fragment and return the full serialized document.
pub fn sanitize_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len());
    write_element(document.root_element(), &mut out, 0);
    out
}

/// Whether an element (by lowercase tag name) survives sanitization.
pub fn is_allowed_element(name: &str) -> bool {
    !DROPPED_ELEMENTS.contains(&name)
}

/// Whether an attribute survives sanitization.
pub fn is_allowed_attribute(name: &str, value: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if name.starts_with("on") || DROPPED_ATTRIBUTES.contains(&name.as_str()) {
        return false;
    }
    if URL_ATTRIBUTES.contains(&name.as_str()) {
        return !is_script_url(value);
    }
    true
}

fn is_script_url(value: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters in schemes.
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:") || compact.starts_with("data:text/html")
}

fn write_element(element: ElementRef<'_>, out: &mut String, depth: usize) {
    let el = element.value();
    let name = el.name();

    if !is_allowed_element(name) {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in el.attrs() {
        if is_allowed_attribute(attr, value) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&encode_double_quoted_attribute(value));
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    if depth >= MAX_DEPTH {
        write_flattened_text(element, out);
    } else {
        for child in element.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                write_element(child_el, out, depth + 1);
            } else if let Some(text) = child.value().as_text() {
                out.push_str(&encode_text(&**text));
            }
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Write the text under `element`, skipping the content of dropped elements.
/// Iterative so arbitrarily deep input cannot exhaust the stack.
fn write_flattened_text(element: ElementRef<'_>, out: &mut String) {
    let mut stack: Vec<_> = element.children().rev().collect();
    while let Some(node) = stack.pop() {
        if let Some(child) = ElementRef::wrap(node) {
            if is_allowed_element(child.value().name()) {
                stack.extend(node.children().rev());
            }
        } else if let Some(text) = node.value().as_text() {
            out.push_str(&encode_text(&**text));
        }
    }
}
