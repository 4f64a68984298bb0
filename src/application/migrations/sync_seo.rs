use serde_json::Value;

use crate::application::seo::{SeoInput, derive_seo, plan_seo_update};
use crate::domain::documents::{DocumentPatch, POST_TYPE, RawDocument};

use super::Migration;

const SEO_FIELD: &str = "seo";

/// Fill `seo.title`, `seo.description` and `seo.ogImage` from post content.
#[derive(Debug, Clone)]
pub struct SyncPostSeo {
    types: Vec<String>,
}

impl SyncPostSeo {
    pub const NAME: &'static str = "sync-post-seo";
}

impl Default for SyncPostSeo {
    fn default() -> Self {
        Self {
            types: vec![POST_TYPE.to_string()],
        }
    }
}

impl Migration for SyncPostSeo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn document_types(&self) -> &[String] {
        &self.types
    }

    fn plan(&self, document: &RawDocument) -> Option<DocumentPatch> {
        let derived = derive_seo(SeoInput {
            title: document.get_str("title"),
            excerpt: document.get_str("excerpt"),
            body_markdown: document.get_str("bodyMarkdown"),
            body: document.get("body"),
            cover_image: document.get("coverImage"),
        });
        let current = document.get(SEO_FIELD).and_then(Value::as_object);
        let next = plan_seo_update(current, &derived)?;

        Some(DocumentPatch::set_field(
            document.id()?,
            SEO_FIELD,
            Value::Object(next),
        ))
    }
}
