//! Sitemap service for sitemap.xml and robots.txt generation.

use std::sync::Arc;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::debug;

use crate::application::content::SiteContent;
use crate::application::repos::{DocumentStore, RepoError};

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("site URL is not configured; set `siteUrl` in site settings or `site.url`")]
    MissingSiteUrl,
    #[error("failed to load content: {0}")]
    Store(#[from] RepoError),
}

/// Service for generating sitemap.xml and robots.txt.
#[derive(Clone)]
pub struct SitemapService {
    store: Arc<dyn DocumentStore>,
    configured_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<OffsetDateTime>,
    pub changefreq: ChangeFrequency,
    pub priority: &'static str,
}

impl SitemapService {
    pub fn new(store: Arc<dyn DocumentStore>, configured_url: Option<String>) -> Self {
        Self {
            store,
            configured_url,
        }
    }

    pub async fn sitemap_xml(&self, now: OffsetDateTime) -> Result<String, SitemapError> {
        let content = SiteContent::load(self.store.as_ref()).await?;
        let base = content
            .site_url(self.configured_url.as_deref())
            .ok_or(SitemapError::MissingSiteUrl)?;

        let entries = sitemap_entries(&content, &base, now);
        debug!(
            target = "inkpress::application::sitemap",
            entries = entries.len(),
            "sitemap generated"
        );
        Ok(render_sitemap(&entries))
    }

    pub async fn robots_txt(&self) -> Result<String, SitemapError> {
        let content = SiteContent::load(self.store.as_ref()).await?;
        Ok(render_robots(
            content.site_url(self.configured_url.as_deref()).as_deref(),
        ))
    }
}

/// Home, blog index, pages, published posts, then taxonomy listings.
pub fn sitemap_entries(content: &SiteContent, base: &str, now: OffsetDateTime) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();
    let mut push = |path: String,
                    lastmod: Option<OffsetDateTime>,
                    changefreq: ChangeFrequency,
                    priority: &'static str| {
        entries.push(SitemapEntry {
            loc: format!("{base}{path}"),
            lastmod,
            changefreq,
            priority,
        })
    };

    push("/".into(), Some(now), ChangeFrequency::Daily, "1.0");
    push("/blog".into(), Some(now), ChangeFrequency::Daily, "0.9");

    for page in &content.pages {
        if let Some(slug) = page.slug() {
            push(
                format!("/{slug}"),
                Some(page.updated_at().unwrap_or(now)),
                ChangeFrequency::Monthly,
                "0.6",
            );
        }
    }

    for post in content.published_posts(now) {
        if let Some(slug) = post.slug() {
            push(
                format!("/blog/{slug}"),
                post.updated_at().or_else(|| post.published_at()),
                ChangeFrequency::Weekly,
                "0.8",
            );
        }
    }

    let taxonomies = [
        ("category", &content.categories, "0.5"),
        ("tag", &content.tags, "0.5"),
        ("author", &content.authors, "0.4"),
    ];
    for (prefix, items, priority) in taxonomies {
        for slug in items.iter().filter_map(|item| item.slug()) {
            push(
                format!("/{prefix}/{slug}"),
                Some(now),
                ChangeFrequency::Weekly,
                priority,
            );
        }
    }

    entries
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", xml_escape(&entry.loc)));
        if let Some(lastmod) = entry.lastmod.and_then(|at| at.format(&Rfc3339).ok()) {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n",
            entry.changefreq.as_str(),
            entry.priority
        ));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn render_robots(site_url: Option<&str>) -> String {
    let mut body = String::from("User-agent: *\nAllow: /\n");
    if let Some(base) = site_url {
        body.push_str(&format!("Sitemap: {base}/sitemap.xml\n"));
    }
    body
}

pub(crate) fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
