//! Dataset documents and typed views over them.
//!
//! Rows are kept as raw JSON objects so fields this crate does not know about
//! survive a read/patch/write cycle untouched. Typed views are decoded on
//! demand and are deliberately lenient.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::domain::error::DomainError;

pub const ID_FIELD: &str = "_id";
pub const TYPE_FIELD: &str = "_type";
pub const REV_FIELD: &str = "_rev";
pub const DRAFT_PREFIX: &str = "drafts.";

pub const POST_TYPE: &str = "post";
pub const PAGE_TYPE: &str = "page";
pub const AUTHOR_TYPE: &str = "author";
pub const CATEGORY_TYPE: &str = "category";
pub const TAG_TYPE: &str = "tag";
pub const SITE_SETTINGS_TYPE: &str = "siteSettings";

/// One dataset row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(Map<String, Value>);

impl RawDocument {
    /// Wrap a JSON value, requiring an object with a string `_id` and `_type`.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        let Value::Object(fields) = value else {
            return Err(DomainError::validation("document is not a JSON object"));
        };
        let document = Self(fields);
        if document.id().is_none() {
            return Err(DomainError::validation("document is missing `_id`"));
        }
        if document.doc_type().is_none() {
            return Err(DomainError::validation("document is missing `_type`"));
        }
        Ok(document)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.0.get(TYPE_FIELD).and_then(Value::as_str)
    }

    pub fn rev(&self) -> Option<&str> {
        self.0.get(REV_FIELD).and_then(Value::as_str)
    }

    pub fn is_draft(&self) -> bool {
        self.id().is_some_and(|id| id.starts_with(DRAFT_PREFIX))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Human label for reports; falls back to `(untitled)`.
    pub fn label(&self) -> &str {
        self.get_str("title")
            .or_else(|| self.get_str("name"))
            .unwrap_or("(untitled)")
    }

    /// Overwrite top-level fields with the supplied values.
    pub fn apply_set(&mut self, set: &Map<String, Value>) {
        for (key, value) in set {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.0.insert(REV_FIELD.to_string(), Value::String(rev.into()));
    }

    /// Decode a typed view; fails only when a present field has the wrong shape.
    pub fn view<T>(&self) -> Result<T, DomainError>
    where
        T: for<'de> Deserialize<'de>,
    {
        T::deserialize(&Value::Object(self.0.clone())).map_err(|err| {
            DomainError::validation(format!(
                "document `{}` does not match the expected shape: {err}",
                self.id().unwrap_or_default()
            ))
        })
    }
}

/// A top-level `set` patch against one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub id: String,
    pub set: Map<String, Value>,
}

impl DocumentPatch {
    pub fn set_field(id: impl Into<String>, field: impl Into<String>, value: Value) -> Self {
        let mut set = Map::new();
        set.insert(field.into(), value);
        Self { id: id.into(), set }
    }
}

/// `{ "_type": "slug", "current": "..." }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlugField {
    #[serde(default)]
    pub current: Option<String>,
}

/// `{ "_type": "reference", "_ref": "..." }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref", default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoView {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub og_image: Option<Value>,
    #[serde(default)]
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<SlugField>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default)]
    pub body_markdown: Option<String>,
    #[serde(default)]
    pub cover_image: Option<Value>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub author: Option<Reference>,
    #[serde(default)]
    pub categories: Vec<Reference>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub seo: Option<SeoView>,
}

impl PostView {
    pub fn slug(&self) -> Option<&str> {
        slug_of(self.slug.as_ref())
    }

    pub fn published_at(&self) -> Option<OffsetDateTime> {
        parse_timestamp(self.published_at.as_deref())
    }

    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        parse_timestamp(self.updated_at.as_deref())
    }

    /// Listed publicly: has a slug, is not a draft and was published at or before `now`.
    pub fn is_published(&self, now: OffsetDateTime) -> bool {
        self.slug().is_some()
            && !self.id.starts_with(DRAFT_PREFIX)
            && self.published_at().is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<SlugField>,
    #[serde(rename = "_updatedAt", default)]
    pub system_updated_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl PageView {
    pub fn slug(&self) -> Option<&str> {
        slug_of(self.slug.as_ref())
    }

    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        parse_timestamp(self.updated_at.as_deref())
            .or_else(|| parse_timestamp(self.system_updated_at.as_deref()))
    }
}

/// Authors, categories and tags share the `{ title|name, slug }` shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<SlugField>,
}

impl TaxonomyView {
    pub fn slug(&self) -> Option<&str> {
        slug_of(self.slug.as_ref())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.title.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsView {
    #[serde(default)]
    pub site_title: Option<String>,
    #[serde(default)]
    pub site_description: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(rename = "defaultOGImage", default)]
    pub default_og_image: Option<Value>,
    #[serde(default)]
    pub logo: Option<Value>,
}

fn slug_of(slug: Option<&SlugField>) -> Option<&str> {
    slug.and_then(|slug| slug.current.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Parse an RFC 3339 timestamp, treating absent or malformed input as `None`.
pub fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    raw.and_then(|value| OffsetDateTime::parse(value.trim(), &Rfc3339).ok())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    fn post(value: Value) -> PostView {
        RawDocument::from_value(value)
            .expect("document")
            .view()
            .expect("post view")
    }

    #[test]
    fn raw_document_requires_identity() {
        assert!(RawDocument::from_value(json!({"_type": "post"})).is_err());
        assert!(RawDocument::from_value(json!({"_id": "a"})).is_err());
        assert!(RawDocument::from_value(json!([1, 2])).is_err());
        assert!(RawDocument::from_value(json!({"_id": "a", "_type": "post"})).is_ok());
    }

    #[test]
    fn apply_set_preserves_unknown_fields() {
        let mut document = RawDocument::from_value(json!({
            "_id": "post-1",
            "_type": "post",
            "popularScore": 42,
            "bodyMarkdown": "old"
        }))
        .expect("document");

        let patch = DocumentPatch::set_field("post-1", "bodyMarkdown", json!("new"));
        document.apply_set(&patch.set);

        assert_eq!(document.get_str("bodyMarkdown"), Some("new"));
        assert_eq!(document.get("popularScore"), Some(&json!(42)));
    }

    #[test]
    fn post_view_reads_slug_and_dates() {
        let view = post(json!({
            "_id": "post-1",
            "_type": "post",
            "title": "Hello",
            "slug": {"_type": "slug", "current": "hello"},
            "publishedAt": "2024-05-01T09:00:00Z",
            "tags": ["rust"]
        }));

        assert_eq!(view.slug(), Some("hello"));
        assert_eq!(view.published_at(), Some(datetime!(2024-05-01 09:00 UTC)));
        assert!(view.is_published(datetime!(2024-06-01 00:00 UTC)));
        assert!(!view.is_published(datetime!(2024-04-01 00:00 UTC)));
    }

    #[test]
    fn drafts_are_never_published() {
        let view = post(json!({
            "_id": "drafts.post-1",
            "_type": "post",
            "slug": {"current": "hello"},
            "publishedAt": "2024-05-01T09:00:00Z"
        }));

        assert!(!view.is_published(datetime!(2025-01-01 00:00 UTC)));
    }

    #[test]
    fn malformed_timestamp_is_ignored() {
        assert_eq!(parse_timestamp(Some("yesterday")), None);
        assert_eq!(parse_timestamp(None), None);
    }
}
