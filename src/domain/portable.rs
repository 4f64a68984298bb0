//! Portable Text rich-text blocks as stored by the CMS.
//!
//! Only the parts the toolkit reads are modelled. Every field is optional so a
//! malformed block decodes instead of failing the whole document.

use serde::{Deserialize, Serialize};

pub const BLOCK_TYPE: &str = "block";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortableBlock {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "lenient_children")]
    pub children: Vec<PortableSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortableSpan {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl PortableBlock {
    /// Whether this is a text block (as opposed to an image, code or embed object).
    pub fn is_text_block(&self) -> bool {
        self.kind.as_deref() == Some(BLOCK_TYPE)
    }

    /// Concatenated text of all child spans.
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|span| span.text.as_deref())
            .collect()
    }

    /// Heading level for `h2`..`h4` styles.
    pub fn heading_style_level(&self) -> Option<u8> {
        match self.style.as_deref()? {
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            _ => None,
        }
    }

    /// Whether the block carries no explicit style or the default paragraph style.
    pub fn is_plain_paragraph(&self) -> bool {
        matches!(self.style.as_deref(), None | Some("normal"))
    }
}

/// Decode a list of blocks from an arbitrary JSON value, skipping entries that
/// are not objects. Non-array input yields an empty list.
pub fn blocks_from_value(value: &serde_json::Value) -> Vec<PortableBlock> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| PortableBlock::deserialize(item).ok())
        .collect()
}

fn lenient_children<'de, D>(deserializer: D) -> Result<Vec<PortableSpan>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let Some(items) = value.as_array() else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| PortableSpan::deserialize(item).ok())
        .collect())
}
