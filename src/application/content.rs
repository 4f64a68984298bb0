//! Read-only snapshot of the publicly relevant part of the dataset.
//!
//! Sitemap, feed and structured-data generation all work from one snapshot so
//! the store is queried once per command.

use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::repos::{DocumentStore, RepoError};
use crate::domain::documents::{
    AUTHOR_TYPE, CATEGORY_TYPE, DRAFT_PREFIX, PAGE_TYPE, POST_TYPE, PageView, PostView, RawDocument, Reference,
    SITE_SETTINGS_TYPE, SiteSettingsView, TAG_TYPE, TaxonomyView,
};

#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    pub settings: Option<SiteSettingsView>,
    pub posts: Vec<PostView>,
    pub pages: Vec<PageView>,
    pub categories: Vec<TaxonomyView>,
    pub tags: Vec<TaxonomyView>,
    pub authors: Vec<TaxonomyView>,
}

impl SiteContent {
    pub async fn load(store: &dyn DocumentStore) -> Result<Self, RepoError> {
        let types = [
            SITE_SETTINGS_TYPE,
            POST_TYPE,
            PAGE_TYPE,
            CATEGORY_TYPE,
            TAG_TYPE,
            AUTHOR_TYPE,
        ]
        .map(str::to_string);
        let documents = store.documents_of_types(&types).await?;
        Ok(Self::from_documents(&documents))
    }

    pub fn from_documents(documents: &[RawDocument]) -> Self {
        let mut content = Self::default();

        for document in documents {
            match document.doc_type() {
                Some(SITE_SETTINGS_TYPE) if !document.is_draft() => {
                    if content.settings.is_none() {
                        content.settings = decode(document);
                    }
                }
                Some(POST_TYPE) => content.posts.extend(decode(document)),
                Some(PAGE_TYPE) if !document.is_draft() => content.pages.extend(decode(document)),
                Some(CATEGORY_TYPE) if !document.is_draft() => {
                    content.categories.extend(decode(document))
                }
                Some(TAG_TYPE) if !document.is_draft() => content.tags.extend(decode(document)),
                Some(AUTHOR_TYPE) if !document.is_draft() => {
                    content.authors.extend(decode(document))
                }
                _ => {}
            }
        }

        content
    }

    /// Published posts, newest first.
    pub fn published_posts(&self, now: OffsetDateTime) -> Vec<&PostView> {
        let mut posts: Vec<&PostView> = self
            .posts
            .iter()
            .filter(|post| post.is_published(now))
            .collect();
        posts.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
        posts
    }

    /// Look up a post by slug, preferring the published document over its draft.
    pub fn post_by_slug(&self, slug: &str) -> Option<&PostView> {
        let mut candidates = self.posts.iter().filter(|post| post.slug() == Some(slug));
        let first = candidates.next()?;
        if !first.id.starts_with(DRAFT_PREFIX) {
            return Some(first);
        }
        candidates
            .find(|post| !post.id.starts_with(DRAFT_PREFIX))
            .or(Some(first))
    }

    pub fn author(&self, reference: Option<&Reference>) -> Option<&TaxonomyView> {
        find_referenced(&self.authors, reference)
    }

    pub fn category(&self, reference: Option<&Reference>) -> Option<&TaxonomyView> {
        find_referenced(&self.categories, reference)
    }

    /// Site URL from settings, falling back to the configured one.
    pub fn site_url(&self, configured: Option<&str>) -> Option<String> {
        let from_settings = self
            .settings
            .as_ref()
            .and_then(|settings| settings.site_url.as_deref());
        resolve_site_url(from_settings, configured)
    }
}

/// First non-blank candidate with trailing slashes removed.
pub fn resolve_site_url(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(|url| url.trim().trim_end_matches('/'))
        .find(|url| !url.is_empty())
        .map(str::to_string)
}

fn find_referenced<'a>(
    items: &'a [TaxonomyView],
    reference: Option<&Reference>,
) -> Option<&'a TaxonomyView> {
    let id = reference?.reference.as_deref()?;
    items.iter().find(|item| item.id == id)
}

fn decode<T: DeserializeOwned>(document: &RawDocument) -> Option<T> {
    match document.view() {
        Ok(view) => Some(view),
        Err(err) => {
            warn!(
                target = "inkpress::application::content",
                id = document.id().unwrap_or_default(),
                error = %err,
                "skipping malformed document"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    fn documents() -> Vec<RawDocument> {
        [
            json!({"_id": "settings", "_type": "siteSettings", "siteTitle": "Blog", "siteUrl": "https://blog.example/"}),
            json!({"_id": "p-old", "_type": "post", "title": "Old", "slug": {"current": "old"}, "publishedAt": "2024-01-01T00:00:00Z"}),
            json!({"_id": "p-new", "_type": "post", "title": "New", "slug": {"current": "new"}, "publishedAt": "2024-03-01T00:00:00Z", "author": {"_ref": "a1"}}),
            json!({"_id": "drafts.p-new", "_type": "post", "title": "New (draft)", "slug": {"current": "new"}, "publishedAt": "2024-03-01T00:00:00Z"}),
            json!({"_id": "p-future", "_type": "post", "title": "Later", "slug": {"current": "later"}, "publishedAt": "2099-01-01T00:00:00Z"}),
            json!({"_id": "p-bad", "_type": "post", "title": 42}),
            json!({"_id": "a1", "_type": "author", "name": "Hana", "slug": {"current": "hana"}}),
            json!({"_id": "drafts.page", "_type": "page", "slug": {"current": "about"}})
        ]
        .into_iter()
        .map(|value| RawDocument::from_value(value).expect("document"))
        .collect()
    }

    #[test]
    fn snapshot_sorts_and_filters_posts() {
        let content = SiteContent::from_documents(&documents());
        let slugs: Vec<_> = content
            .published_posts(datetime!(2024-06-01 00:00 UTC))
            .into_iter()
            .filter_map(PostView::slug)
            .collect();

        assert_eq!(slugs, ["new", "old"]);
        assert!(content.pages.is_empty());
        assert_eq!(content.posts.len(), 4);
    }

    #[test]
    fn post_lookup_prefers_published_document() {
        let content = SiteContent::from_documents(&documents());
        let post = content.post_by_slug("new").expect("post");
        assert_eq!(post.id, "p-new");
        assert_eq!(
            content.author(post.author.as_ref()).and_then(TaxonomyView::display_name),
            Some("Hana")
        );
    }

    #[test]
    fn site_url_prefers_settings_and_trims_slash() {
        let content = SiteContent::from_documents(&documents());
        assert_eq!(
            content.site_url(Some("https://fallback.example")).as_deref(),
            Some("https://blog.example")
        );
        assert_eq!(
            resolve_site_url(Some("  "), Some("https://fallback.example/")).as_deref(),
            Some("https://fallback.example")
        );
        assert_eq!(resolve_site_url(None, None), None);
    }
}
