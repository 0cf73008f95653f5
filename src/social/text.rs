// src/social/text.rs
//! Plain-text extraction from status HTML.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Status HTML → single-line plain text.
pub fn extract_text(html: &str) -> String {
    // 1) Paragraph and line breaks become spaces
    static RE_BREAKS: OnceCell<Regex> = OnceCell::new();
    let re_breaks =
        RE_BREAKS.get_or_init(|| Regex::new(r"(?i)</p\s*>|<br\s*/?>").expect("static regex"));
    let out = re_breaks.replace_all(html, " ");

    // 2) Strip remaining tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    let out = re_tags.replace_all(&out, "");

    // 3) HTML entity decode (after stripping, so `&lt;b&gt;` survives as text)
    let out = html_escape::decode_html_entities(&out);

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// First `max` chars, with `...` when cut.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max).collect();
    s.push_str("...");
    s
}
