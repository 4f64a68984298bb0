//! Image descriptors (asset reference plus alt text, crop and hotspot).

use serde::{Deserialize, Serialize};

pub const IMAGE_TYPE: &str = "image";
pub const REFERENCE_TYPE: &str = "reference";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<ImageCrop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<ImageHotspot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "_ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageCrop {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageHotspot {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl ImageDescriptor {
    /// Decode an image from arbitrary JSON; anything that is not an image-shaped
    /// object yields `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Self::deserialize(value).ok()
    }

    /// Non-empty asset reference, if any.
    pub fn asset_ref(&self) -> Option<&str> {
        self.asset
            .as_ref()
            .and_then(|asset| asset.reference.as_deref())
            .filter(|reference| !reference.is_empty())
    }

    /// The fields that identify an image for equality purposes.
    pub fn identity(&self) -> ImageIdentity<'_> {
        ImageIdentity {
            asset_ref: self.asset.as_ref().and_then(|a| a.reference.as_deref()),
            alt: self.alt.as_deref(),
            crop: self.crop.as_ref(),
            hotspot: self.hotspot.as_ref(),
        }
    }
}

/// Borrowed projection of the identity-relevant parts of an image.
#[derive(Debug, PartialEq)]
pub struct ImageIdentity<'a> {
    pub asset_ref: Option<&'a str>,
    pub alt: Option<&'a str>,
    pub crop: Option<&'a ImageCrop>,
    pub hotspot: Option<&'a ImageHotspot>,
}

const IMAGE_CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Project coordinates needed to turn asset references into public URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCdn {
    pub project_id: String,
    pub dataset: String,
}

impl ImageCdn {
    /// Public URL for an image field; plain strings are taken as URLs already.
    pub fn url_for(&self, image: &serde_json::Value) -> Option<String> {
        if let Some(url) = image.as_str() {
            return Some(url.to_string()).filter(|url| !url.is_empty());
        }
        let descriptor = ImageDescriptor::from_value(image)?;
        cdn_url(descriptor.asset_ref()?, &self.project_id, &self.dataset)
    }
}

/// Resolve an `image-<id>-<w>x<h>-<ext>` asset reference to its CDN URL.
pub fn cdn_url(asset_ref: &str, project_id: &str, dataset: &str) -> Option<String> {
    let rest = asset_ref.strip_prefix("image-")?;
    let (stem, extension) = rest.rsplit_once('-')?;
    let (id, dimensions) = stem.rsplit_once('-')?;
    let (width, height) = dimensions.split_once('x')?;

    let is_number = |value: &str| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit());
    if id.is_empty() || extension.is_empty() || !is_number(width) || !is_number(height) {
        return None;
    }

    Some(format!(
        "{IMAGE_CDN_BASE}/{project_id}/{dataset}/{id}-{width}x{height}.{extension}"
    ))
}
