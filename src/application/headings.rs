//! Table-of-contents extraction from Portable Text blocks or markdown.
//!
//! Both sources feed the same [`AnchorSlugger`], so the ids produced here match
//! the `id` attributes the renderer assigns to `h2`..`h4` elements.

use comrak::{
    Arena,
    nodes::{AstNode, NodeValue},
    options::Options,
    parse_document,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::application::markdown::{collapse_whitespace, normalize_markdown};
use crate::domain::{portable::PortableBlock, slug::AnchorSlugger};

static LITERAL_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([#＃]{2,4})[^\S\r\n]+(.+)$").expect("literal heading pattern")
});

/// Heading depth included in the table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HeadingLevel {
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            _ => None,
        }
    }

    pub fn depth(self) -> u8 {
        match self {
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.depth()
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        Self::from_depth(depth).ok_or_else(|| format!("heading level {depth} is outside 2..=4"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: HeadingLevel,
}

/// Input accepted by [`extract_headings`].
#[derive(Debug, Clone, Copy)]
pub enum HeadingSource<'a> {
    Blocks(&'a [PortableBlock]),
    Markdown(&'a str),
}

pub fn extract_headings(source: HeadingSource<'_>) -> Vec<Heading> {
    match source {
        HeadingSource::Blocks(blocks) => extract_headings_from_blocks(blocks),
        HeadingSource::Markdown(markdown) => extract_headings_from_markdown(markdown),
    }
}

/// Collect `h2`..`h4` blocks, plus plain paragraphs whose whole text is a
/// literal `## Title` marker line.
pub fn extract_headings_from_blocks(blocks: &[PortableBlock]) -> Vec<Heading> {
    let mut builder = TocBuilder::default();

    for block in blocks.iter().filter(|block| block.is_text_block()) {
        let text = block.plain_text();
        if let Some(level) = block
            .heading_style_level()
            .and_then(HeadingLevel::from_depth)
        {
            builder.push(level, &text);
        } else if block.is_plain_paragraph()
            && let Some((level, title)) = literal_heading(&text)
        {
            builder.push(level, title);
        }
    }

    builder.finish()
}

/// Parse markdown and collect level 2..4 headings in document order.
pub fn extract_headings_from_markdown(markdown: &str) -> Vec<Heading> {
    let normalized = normalize_markdown(markdown);
    let arena = Arena::new();
    let root = parse_document(&arena, &normalized, &parser_options());

    let mut builder = TocBuilder::default();
    visit_headings(root, &mut builder);
    builder.finish()
}

fn parser_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options
}

fn visit_headings<'a>(node: &'a AstNode<'a>, builder: &mut TocBuilder) {
    let depth = {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Heading(heading) => Some(heading.level),
            _ => None,
        }
    };

    if let Some(level) = depth.and_then(HeadingLevel::from_depth) {
        builder.push(level, &collect_inline_text(node));
        return;
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        visit_headings(next, builder);
        child = next.next_sibling();
    }
}

fn collect_inline_text<'a>(node: &'a AstNode<'a>) -> String {
    fn walk<'a>(node: &'a AstNode<'a>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

fn literal_heading(text: &str) -> Option<(HeadingLevel, &str)> {
    let caps = LITERAL_HEADING.captures(text.trim())?;
    let depth = u8::try_from(caps.get(1)?.as_str().chars().count()).ok()?;
    let level = HeadingLevel::from_depth(depth)?;
    Some((level, caps.get(2)?.as_str()))
}

#[derive(Default)]
struct TocBuilder {
    slugger: AnchorSlugger,
    headings: Vec<Heading>,
}

impl TocBuilder {
    /// Empty headings are skipped before an id is allocated.
    fn push(&mut self, level: HeadingLevel, raw_text: &str) {
        let text = collapse_whitespace(raw_text);
        if text.is_empty() {
            return;
        }
        let id = self.slugger.anchor_for(&text);
        self.headings.push(Heading { id, text, level });
    }

    fn finish(self) -> Vec<Heading> {
        self.headings
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::portable::blocks_from_value;

    use super::*;

    fn ids(headings: &[Heading]) -> Vec<&str> {
        headings.iter().map(|heading| heading.id.as_str()).collect()
    }

    #[test]
    fn duplicate_headings_get_numbered_suffixes() {
        let headings = extract_headings(HeadingSource::Markdown("## Intro\n\ntext\n\n## Intro\n"));
        assert_eq!(ids(&headings), ["intro", "intro-2"]);
        assert!(headings.iter().all(|heading| heading.text == "Intro"));
    }

    #[test]
    fn markdown_keeps_levels_two_to_four_only() {
        let markdown = "# Title\n\n## 概要\n\n### Setup `cargo`\n\n#### Deep *dive*\n\n##### Too deep\n";
        let headings = extract_headings_from_markdown(markdown);

        assert_eq!(ids(&headings), ["概要", "setup-cargo", "deep-dive"]);
        assert_eq!(
            headings.iter().map(|h| h.level.depth()).collect::<Vec<_>>(),
            [2, 3, 4]
        );
        assert_eq!(headings[1].text, "Setup cargo");
    }

    #[test]
    fn markdown_full_width_markers_are_recognised() {
        let headings = extract_headings_from_markdown("＃＃ はじめに\n\n本文\n");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].id, "はじめに");
        assert_eq!(headings[0].level, HeadingLevel::H2);
    }

    #[test]
    fn markdown_ignores_headings_inside_code() {
        let headings = extract_headings_from_markdown("```\n## not a heading\n```\n\n## Real\n");
        assert_eq!(ids(&headings), ["real"]);
    }

    #[test]
    fn blocks_use_style_and_literal_markers() {
        let blocks = blocks_from_value(&json!([
            {"_type": "block", "style": "h2", "children": [{"text": "Overview"}]},
            {"_type": "block", "style": "normal", "children": [{"text": "＃＃＃ Details"}]},
            {"_type": "block", "children": [{"text": "#### Deeper"}]},
            {"_type": "block", "style": "normal", "children": [{"text": "just text"}]},
            {"_type": "block", "style": "blockquote", "children": [{"text": "## quoted"}]},
            {"_type": "block", "style": "h5", "children": [{"text": "Skipped"}]},
            {"_type": "imageWithCaption", "style": "h2"}
        ]));

        let headings = extract_headings_from_blocks(&blocks);
        assert_eq!(ids(&headings), ["overview", "details", "deeper"]);
        assert_eq!(headings[1].level, HeadingLevel::H3);
        assert_eq!(headings[2].level, HeadingLevel::H4);
    }

    #[test]
    fn empty_headings_are_dropped_without_consuming_ids() {
        let blocks = blocks_from_value(&json!([
            {"_type": "block", "style": "h2", "children": [{"text": "   "}]},
            {"_type": "block", "style": "h2", "children": []},
            {"_type": "block", "style": "h3", "children": [{"text": "！！"}]},
            {"_type": "block", "style": "h3", "children": [{"text": "？？"}]}
        ]));

        let headings = extract_headings_from_blocks(&blocks);
        assert_eq!(ids(&headings), ["section", "section-2"]);
    }

    #[test]
    fn heading_level_serializes_as_number() {
        let heading = Heading {
            id: "intro".into(),
            text: "Intro".into(),
            level: HeadingLevel::H3,
        };
        let value = serde_json::to_value(&heading).expect("serialize");
        assert_eq!(value, json!({"id": "intro", "text": "Intro", "level": 3}));
    }
}
