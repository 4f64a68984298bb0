//! Markdown text transforms.

pub mod normalize;
pub mod plain_text;

pub use normalize::normalize_markdown;
pub use plain_text::{collapse_whitespace, markdown_to_plain_text, portable_to_plain_text};
