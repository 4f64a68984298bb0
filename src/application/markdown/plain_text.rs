//! Flatten markdown and Portable Text into a single line of plain text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::portable::PortableBlock;

use super::normalize::normalize_markdown;

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("fenced code pattern"));
static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]*)`").expect("inline code pattern"));
static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]+\)").expect("image pattern"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link pattern"));
static BLOCK_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*([#＃]{1,6}|>|[-*+]|[0-9]+\.)[ \t]+").expect("block marker pattern")
});
static EMPHASIS_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_~]").expect("emphasis pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE.replace_all(value, " ").trim().to_string()
}

/// Reduce markdown to readable plain text.
///
/// Fenced code is dropped, inline code/link text/image alt text are kept, and
/// block markers and emphasis characters are removed.
pub fn markdown_to_plain_text(markdown: &str) -> String {
    let normalized = normalize_markdown(markdown);
    let text = FENCED_CODE.replace_all(&normalized, " ");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = BLOCK_MARKER.replace_all(&text, "");
    let text = EMPHASIS_CHARS.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Join the span text of every text block, separating blocks with a space.
pub fn portable_to_plain_text(blocks: &[PortableBlock]) -> String {
    let joined = blocks
        .iter()
        .map(|block| {
            if block.is_text_block() {
                block.plain_text()
            } else {
                String::new()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}
