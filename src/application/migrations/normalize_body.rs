use serde_json::Value;

use crate::application::markdown::normalize_markdown;
use crate::domain::documents::{DocumentPatch, POST_TYPE, RawDocument};

use super::Migration;

const BODY_MARKDOWN_FIELD: &str = "bodyMarkdown";

/// Rewrite `bodyMarkdown` through the emphasis and heading normalizer.
#[derive(Debug, Clone)]
pub struct NormalizeBodyMarkdown {
    types: Vec<String>,
}

impl NormalizeBodyMarkdown {
    pub const NAME: &'static str = "normalize-body-markdown";

    /// Blank entries are dropped; an empty list falls back to `post`.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut types: Vec<String> = types
            .into_iter()
            .map(|ty| ty.as_ref().trim().to_string())
            .filter(|ty| !ty.is_empty())
            .collect();
        if types.is_empty() {
            types.push(POST_TYPE.to_string());
        }
        Self { types }
    }
}

impl Default for NormalizeBodyMarkdown {
    fn default() -> Self {
        Self::new([POST_TYPE])
    }
}

impl Migration for NormalizeBodyMarkdown {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn document_types(&self) -> &[String] {
        &self.types
    }

    fn plan(&self, document: &RawDocument) -> Option<DocumentPatch> {
        let body = document.get_str(BODY_MARKDOWN_FIELD)?;
        let normalized = normalize_markdown(body);
        if normalized == body {
            return None;
        }
        Some(DocumentPatch::set_field(
            document.id()?,
            BODY_MARKDOWN_FIELD,
            Value::String(normalized),
        ))
    }

    fn summary_detail(&self) -> Option<String> {
        Some(format!("types={}", self.types.join(",")))
    }
}
