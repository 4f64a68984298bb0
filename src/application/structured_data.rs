//! schema.org JSON-LD payloads for post pages.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::application::content::SiteContent;
use crate::domain::{documents::PostView, image::ImageCdn};

const SCHEMA_CONTEXT: &str = "https://schema.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    pub name: String,
    pub url: String,
}

impl BreadcrumbItem {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// `BlogPosting` for one post. Fields without a value are omitted.
pub fn blog_posting_json_ld(
    post: &PostView,
    content: &SiteContent,
    site_url: Option<&str>,
    images: Option<&ImageCdn>,
) -> Value {
    let settings = content.settings.as_ref();
    let seo = post.seo.as_ref();
    let slug = post.slug();

    let mut object = Map::new();
    object.insert("@context".into(), json!(SCHEMA_CONTEXT));
    object.insert("@type".into(), json!("BlogPosting"));

    insert_opt(
        &mut object,
        "headline",
        first_non_empty([
            seo.and_then(|seo| seo.title.as_deref()),
            post.title.as_deref(),
        ])
        .map(Value::from),
    );
    insert_opt(
        &mut object,
        "description",
        first_non_empty([
            seo.and_then(|seo| seo.description.as_deref()),
            post.excerpt.as_deref(),
        ])
        .map(Value::from),
    );
    insert_opt(
        &mut object,
        "image",
        images
            .zip(post.cover_image.as_ref())
            .and_then(|(cdn, cover)| cdn.url_for(cover))
            .map(|url| json!([url])),
    );
    insert_opt(
        &mut object,
        "datePublished",
        post.published_at.as_deref().map(Value::from),
    );
    insert_opt(
        &mut object,
        "dateModified",
        post.updated_at
            .as_deref()
            .or(post.published_at.as_deref())
            .map(Value::from),
    );

    let author = content.author(post.author.as_ref());
    insert_opt(
        &mut object,
        "author",
        author.and_then(|author| {
            let name = author.display_name()?;
            let mut person = Map::new();
            person.insert("@type".into(), json!("Person"));
            person.insert("name".into(), json!(name));
            insert_opt(
                &mut person,
                "url",
                site_url
                    .zip(author.slug())
                    .map(|(site, slug)| json!(format!("{site}/author/{slug}"))),
            );
            Some(Value::Object(person))
        }),
    );

    insert_opt(
        &mut object,
        "publisher",
        settings.and_then(|settings| {
            let name = first_non_empty([settings.site_title.as_deref()])?;
            let mut organization = Map::new();
            organization.insert("@type".into(), json!("Organization"));
            organization.insert("name".into(), json!(name));
            let logo = settings
                .default_og_image
                .as_ref()
                .and_then(|image| match images {
                    Some(cdn) => cdn.url_for(image),
                    None => image.as_str().map(str::to_string),
                });
            insert_opt(
                &mut organization,
                "logo",
                logo.map(|url| json!({"@type": "ImageObject", "url": url})),
            );
            Some(Value::Object(organization))
        }),
    );

    let canonical = seo
        .and_then(|seo| seo.canonical_url.as_deref())
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            site_url
                .zip(slug)
                .map(|(site, slug)| format!("{site}/blog/{slug}"))
        });
    insert_opt(&mut object, "mainEntityOfPage", canonical.map(Value::from));

    let section = post
        .categories
        .first()
        .and_then(|reference| content.category(Some(reference)))
        .and_then(|category| category.title.as_deref().or(category.name.as_deref()));
    insert_opt(&mut object, "articleSection", section.map(Value::from));

    if !post.tags.is_empty() {
        object.insert("keywords".into(), json!(post.tags.join(", ")));
    }

    Value::Object(object)
}

/// `BreadcrumbList` with 1-based positions in the given order.
pub fn breadcrumb_json_ld(items: &[BreadcrumbItem]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": item.name,
                "item": item.url,
            })
        })
        .collect();

    json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

/// Home › Blog › post trail used on post pages.
pub fn post_breadcrumbs(post: &PostView, site_url: &str) -> Vec<BreadcrumbItem> {
    let mut items = vec![
        BreadcrumbItem::new("ホーム", format!("{site_url}/")),
        BreadcrumbItem::new("ブログ", format!("{site_url}/blog")),
    ];
    if let Some(slug) = post.slug() {
        let title = post.title.as_deref().unwrap_or(slug);
        items.push(BreadcrumbItem::new(title, format!("{site_url}/blog/{slug}")));
    }
    items
}

fn insert_opt(object: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        object.insert(key.to_string(), value);
    }
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::documents::RawDocument;

    use super::*;

    fn content() -> SiteContent {
        let documents: Vec<RawDocument> = [
            json!({"_id": "settings", "_type": "siteSettings", "siteTitle": "Inkpress Blog",
                   "defaultOGImage": {"asset": {"_ref": "image-logo-64x64-png"}}}),
            json!({"_id": "a1", "_type": "author", "name": "Hana", "slug": {"current": "hana"}}),
            json!({"_id": "c1", "_type": "category", "title": "Rust", "slug": {"current": "rust"}}),
            json!({"_id": "p1", "_type": "post", "title": "Hello", "slug": {"current": "hello"},
                   "excerpt": "Greeting", "publishedAt": "2024-05-01T09:00:00Z",
                   "coverImage": {"asset": {"_ref": "image-cover-1200x630-jpg"}},
                   "author": {"_ref": "a1"}, "categories": [{"_ref": "c1"}], "tags": ["rust", "cli"],
                   "seo": {"title": "Hello, SEO"}})
        ]
        .into_iter()
        .map(|value| RawDocument::from_value(value).expect("document"))
        .collect();
        SiteContent::from_documents(&documents)
    }

    fn cdn() -> ImageCdn {
        ImageCdn {
            project_id: "proj".into(),
            dataset: "production".into(),
        }
    }

    #[test]
    fn blog_posting_includes_resolved_fields() {
        let content = content();
        let post = content.post_by_slug("hello").expect("post");
        let value = blog_posting_json_ld(post, &content, Some("https://blog.example"), Some(&cdn()));

        assert_eq!(value["@type"], "BlogPosting");
        assert_eq!(value["headline"], "Hello, SEO");
        assert_eq!(value["description"], "Greeting");
        assert_eq!(
            value["image"],
            json!(["https://cdn.sanity.io/images/proj/production/cover-1200x630.jpg"])
        );
        assert_eq!(value["dateModified"], "2024-05-01T09:00:00Z");
        assert_eq!(value["author"]["url"], "https://blog.example/author/hana");
        assert_eq!(value["publisher"]["name"], "Inkpress Blog");
        assert_eq!(
            value["publisher"]["logo"]["url"],
            "https://cdn.sanity.io/images/proj/production/logo-64x64.png"
        );
        assert_eq!(value["mainEntityOfPage"], "https://blog.example/blog/hello");
        assert_eq!(value["articleSection"], "Rust");
        assert_eq!(value["keywords"], "rust, cli");
    }

    #[test]
    fn blog_posting_omits_missing_values() {
        let content = content();
        let post = content.post_by_slug("hello").expect("post");
        let value = blog_posting_json_ld(post, &content, None, None);
        let object = value.as_object().expect("object");

        assert!(!object.contains_key("image"));
        assert!(!object.contains_key("mainEntityOfPage"));
        assert!(!object.contains_key("logo"));
        assert!(!object["author"].as_object().expect("author").contains_key("url"));
    }

    #[test]
    fn breadcrumbs_are_numbered_from_one() {
        let value = breadcrumb_json_ld(&[
            BreadcrumbItem::new("Home", "https://blog.example/"),
            BreadcrumbItem::new("Blog", "https://blog.example/blog"),
        ]);
        assert_eq!(value["@type"], "BreadcrumbList");
        assert_eq!(value["itemListElement"][0]["position"], 1);
        assert_eq!(value["itemListElement"][1]["position"], 2);
        assert_eq!(value["itemListElement"][1]["item"], "https://blog.example/blog");
    }
}
