//! Derive `seo.title`, `seo.description` and `seo.ogImage` from post content.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::application::markdown::{
    collapse_whitespace, markdown_to_plain_text, portable_to_plain_text,
};
use crate::domain::{
    image::{AssetReference, IMAGE_TYPE, ImageDescriptor, REFERENCE_TYPE},
    portable::blocks_from_value,
};

/// Upper bound for meta descriptions, counted in Unicode scalar values.
pub const MAX_SEO_DESCRIPTION: usize = 160;

const ELLIPSIS: &str = "...";

/// Borrowed post fields the derivation reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeoInput<'a> {
    pub title: Option<&'a str>,
    pub excerpt: Option<&'a str>,
    pub body_markdown: Option<&'a str>,
    pub body: Option<&'a Value>,
    pub cover_image: Option<&'a Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<ImageDescriptor>,
}

impl SeoFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.og_image.is_none()
    }
}

pub fn derive_seo(input: SeoInput<'_>) -> SeoFields {
    SeoFields {
        title: derive_seo_title(input.title),
        description: derive_seo_description(input.body_markdown, input.excerpt, input.body),
        og_image: derive_seo_og_image(input.cover_image),
    }
}

pub fn derive_seo_title(title: Option<&str>) -> Option<String> {
    non_empty(title.map(str::trim).unwrap_or_default())
}

/// Markdown body first, then the excerpt, then the Portable Text body.
pub fn derive_seo_description(
    body_markdown: Option<&str>,
    excerpt: Option<&str>,
    body: Option<&Value>,
) -> Option<String> {
    let candidate = body_markdown
        .map(markdown_to_plain_text)
        .filter(|text| !text.is_empty())
        .or_else(|| {
            excerpt
                .map(collapse_whitespace)
                .filter(|text| !text.is_empty())
        })
        .or_else(|| {
            body.map(|value| portable_to_plain_text(&blocks_from_value(value)))
                .filter(|text| !text.is_empty())
        })?;

    Some(truncate_text(&candidate, MAX_SEO_DESCRIPTION))
}

/// Shorten `value` to at most `max` characters, ending in `...` when cut.
pub fn truncate_text(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }

    let kept: String = value.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

/// Copy the cover image into a canonical og image; covers without an asset
/// reference produce nothing.
pub fn derive_seo_og_image(cover: Option<&Value>) -> Option<ImageDescriptor> {
    let cover = ImageDescriptor::from_value(cover?)?;
    let reference = cover.asset_ref()?.to_string();

    Some(ImageDescriptor {
        kind: Some(IMAGE_TYPE.to_string()),
        asset: Some(AssetReference {
            kind: Some(REFERENCE_TYPE.to_string()),
            reference: Some(reference),
        }),
        alt: cover.alt.filter(|alt| !alt.is_empty()),
        crop: cover.crop,
        hotspot: cover.hotspot,
    })
}

/// Structural comparison of asset reference, alt, crop and hotspot.
pub fn is_same_seo_image(a: Option<&ImageDescriptor>, b: Option<&ImageDescriptor>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(left), Some(right)) => left.identity() == right.identity(),
        _ => false,
    }
}

/// Merge derived fields into the stored `seo` object.
///
/// Returns `None` when nothing would change. Empty derived fields never
/// overwrite stored values, and keys this crate does not derive are kept.
pub fn plan_seo_update(
    current: Option<&Map<String, Value>>,
    derived: &SeoFields,
) -> Option<Map<String, Value>> {
    let current_str = |key: &str| current.and_then(|seo| seo.get(key)).and_then(Value::as_str);
    let current_image = current
        .and_then(|seo| seo.get("ogImage"))
        .and_then(ImageDescriptor::from_value);

    let title_changed = derived
        .title
        .as_deref()
        .is_some_and(|title| current_str("title") != Some(title));
    let description_changed = derived
        .description
        .as_deref()
        .is_some_and(|description| current_str("description") != Some(description));
    let image_changed = derived
        .og_image
        .as_ref()
        .is_some_and(|image| !is_same_seo_image(current_image.as_ref(), Some(image)));

    if !title_changed && !description_changed && !image_changed {
        return None;
    }

    let mut next = current.cloned().unwrap_or_default();
    if let Some(title) = &derived.title {
        next.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(description) = &derived.description {
        next.insert("description".to_string(), Value::String(description.clone()));
    }
    if let Some(image) = &derived.og_image
        && let Ok(value) = serde_json::to_value(image)
    {
        next.insert("ogImage".to_string(), value);
    }
    Some(next)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
