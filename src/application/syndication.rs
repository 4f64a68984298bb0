//! Syndication service for RSS feed generation.

use std::sync::Arc;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc2822};
use tracing::debug;

use crate::application::content::SiteContent;
use crate::application::repos::{DocumentStore, RepoError};
use crate::application::sitemap::xml_escape;

#[derive(Debug, Error)]
pub enum SyndicationError {
    #[error("site URL is not configured; set `siteUrl` in site settings or `site.url`")]
    MissingSiteUrl,
    #[error("failed to load content: {0}")]
    Store(#[from] RepoError),
}

/// Channel defaults used when site settings leave a value blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    pub site_url: Option<String>,
    pub language: String,
    pub limit: usize,
    pub default_title: String,
    pub default_description: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            site_url: None,
            language: "ja".to_string(),
            limit: 20,
            default_title: "Blog".to_string(),
            default_description: "Latest posts".to_string(),
        }
    }
}

/// Service for generating the RSS 2.0 feed.
#[derive(Clone)]
pub struct SyndicationService {
    store: Arc<dyn DocumentStore>,
    options: FeedOptions,
}

impl SyndicationService {
    pub fn new(store: Arc<dyn DocumentStore>, options: FeedOptions) -> Self {
        Self { store, options }
    }

    pub async fn rss_feed(&self, now: OffsetDateTime) -> Result<String, SyndicationError> {
        let content = SiteContent::load(self.store.as_ref()).await?;
        render_rss(&content, &self.options, now)
    }
}

/// Render the newest published posts as RSS 2.0.
pub fn render_rss(
    content: &SiteContent,
    options: &FeedOptions,
    now: OffsetDateTime,
) -> Result<String, SyndicationError> {
    let base = content
        .site_url(options.site_url.as_deref())
        .ok_or(SyndicationError::MissingSiteUrl)?;
    let settings = content.settings.as_ref();

    let title = settings
        .and_then(|settings| settings.site_title.as_deref())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(options.default_title.as_str());
    let description = settings
        .and_then(|settings| settings.site_description.as_deref())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(options.default_description.as_str());

    let mut items = String::new();
    let posts = content.published_posts(now);
    for post in posts.iter().take(options.limit) {
        let (Some(slug), Some(published)) = (post.slug(), post.published_at()) else {
            continue;
        };
        let pub_date = published
            .format(&Rfc2822)
            .unwrap_or_else(|_| published.to_string());
        let link = xml_escape(&format!("{base}/blog/{slug}"));
        items.push_str(&format!(
            "    <item>\n      <title>{}</title>\n      <link>{link}</link>\n      <guid isPermaLink=\"true\">{link}</guid>\n      <pubDate>{pub_date}</pubDate>\n      <description>{}</description>\n    </item>\n",
            xml_escape(post.title.as_deref().unwrap_or(slug)),
            cdata(post.excerpt.as_deref().unwrap_or_default()),
        ));
    }

    debug!(
        target = "inkpress::application::syndication",
        items = posts.len().min(options.limit),
        "rss feed generated"
    );

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n    <language>{}</language>\n{items}  </channel>\n</rss>\n",
        xml_escape(title),
        xml_escape(&base),
        xml_escape(description),
        xml_escape(&options.language),
    ))
}

/// Wrap text in CDATA, splitting any embedded terminator.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::domain::documents::RawDocument;

    use super::*;

    fn content(with_settings: bool) -> SiteContent {
        let mut values = vec![
            json!({"_id": "p1", "_type": "post", "title": "Tom & Jerry", "slug": {"current": "tom"},
                   "excerpt": "A <b>chase</b> ]]> ends", "publishedAt": "2024-05-01T09:00:00Z"}),
            json!({"_id": "p2", "_type": "post", "title": "Older", "slug": {"current": "older"},
                   "publishedAt": "2024-04-01T09:00:00Z"}),
            json!({"_id": "p3", "_type": "post", "title": "Future", "slug": {"current": "future"},
                   "publishedAt": "2099-04-01T09:00:00Z"}),
        ];
        if with_settings {
            values.push(json!({"_id": "siteSettings", "_type": "siteSettings",
                               "siteTitle": "Inkpress", "siteUrl": "https://blog.example/"}));
        }
        let documents: Vec<RawDocument> = values
            .into_iter()
            .map(|value| RawDocument::from_value(value).expect("document"))
            .collect();
        SiteContent::from_documents(&documents)
    }

    #[test]
    fn feed_lists_newest_published_posts() {
        let xml = render_rss(
            &content(true),
            &FeedOptions::default(),
            datetime!(2024-06-01 00:00 UTC),
        )
        .expect("feed");

        assert!(xml.contains("<title>Inkpress</title>"));
        assert!(xml.contains("<description>Latest posts</description>"));
        assert!(xml.contains("<language>ja</language>"));
        assert!(xml.contains("<title>Tom &amp; Jerry</title>"));
        assert!(xml.contains("<link>https://blog.example/blog/tom</link>"));
        assert!(xml.contains("<pubDate>Wed, 01 May 2024 09:00:00 +0000</pubDate>"));
        assert!(xml.contains("<![CDATA[A <b>chase</b> ]]]]><![CDATA[> ends]]>"));
        assert!(!xml.contains("future"));

        let tom = xml.find("blog/tom").expect("tom");
        let older = xml.find("blog/older").expect("older");
        assert!(tom < older);
    }

    #[test]
    fn feed_respects_limit() {
        let options = FeedOptions {
            limit: 1,
            ..FeedOptions::default()
        };
        let xml = render_rss(&content(true), &options, datetime!(2024-06-01 00:00 UTC))
            .expect("feed");
        assert_eq!(xml.matches("<item>").count(), 1);
    }

    #[test]
    fn feed_requires_site_url() {
        let result = render_rss(
            &content(false),
            &FeedOptions::default(),
            datetime!(2024-06-01 00:00 UTC),
        );
        assert!(matches!(result, Err(SyndicationError::MissingSiteUrl)));

        let options = FeedOptions {
            site_url: Some("https://configured.example".into()),
            ..FeedOptions::default()
        };
        let xml = render_rss(&content(false), &options, datetime!(2024-06-01 00:00 UTC))
            .expect("feed");
        assert!(xml.contains("<title>Blog</title>"));
        assert!(xml.contains("https://configured.example/blog/tom"));
    }
}
