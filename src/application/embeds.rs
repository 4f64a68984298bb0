//! Resolve YouTube and X/Twitter links into embeddable player URLs.
//!
//! A paragraph that consists of nothing but one such link is rendered as an
//! embed instead of a plain anchor.

use comrak::{
    Arena,
    nodes::{AstNode, NodeValue},
    options::Options,
    parse_document,
};
use serde::Serialize;
use url::Url;

const YOUTUBE_BASE: &str = "https://www.youtube.com";
const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed";
const TWITTER_BASE: &str = "https://twitter.com";
const TWEET_FRAME: &str = "https://twitframe.com/show";

const TWITTER_HOSTS: &[&str] = &["twitter.com", "www.twitter.com", "x.com", "www.x.com"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embed {
    Tweet { url: String, embed_url: String },
    Youtube { url: String, embed_url: String },
}

impl Embed {
    pub fn embed_url(&self) -> &str {
        match self {
            Self::Tweet { embed_url, .. } | Self::Youtube { embed_url, .. } => embed_url,
        }
    }
}

/// `https://www.youtube.com/embed/{id}` for watch, short-link, embed, shorts
/// and `/v/` URLs. Relative input resolves against youtube.com.
pub fn youtube_embed_url(raw: &str) -> Option<String> {
    let url = Url::parse(YOUTUBE_BASE).ok()?.join(raw.trim()).ok()?;

    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    let video_id = match from_query {
        Some(id) => id,
        None => {
            let path = url.path().trim_start_matches('/');
            if path.is_empty() {
                return None;
            }
            let is_short_link = url.host_str().is_some_and(|host| host.contains("youtu.be"));
            if is_short_link {
                path.to_string()
            } else {
                video_id_from_path(path)?
            }
        }
    };

    Some(format!("{YOUTUBE_EMBED_BASE}/{video_id}"))
}

fn video_id_from_path(path: &str) -> Option<String> {
    for prefix in ["embed/", "shorts/", "v/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            let id = rest.split(['/', '?']).next().unwrap_or_default();
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    (path != "watch").then(|| path.to_string())
}

/// twitframe wrapper around the normalized tweet URL. Relative input resolves
/// against twitter.com.
pub fn tweet_embed_url(raw: &str) -> Option<String> {
    let tweet = Url::parse(TWITTER_BASE).ok()?.join(raw.trim()).ok()?;
    let frame = Url::parse_with_params(TWEET_FRAME, &[("url", tweet.as_str())]).ok()?;
    Some(frame.into())
}

pub fn is_twitter_url(candidate: &str) -> bool {
    host_of(candidate).is_some_and(|host| TWITTER_HOSTS.contains(&host.as_str()))
}

pub fn is_youtube_url(candidate: &str) -> bool {
    host_of(candidate)
        .is_some_and(|host| host.contains("youtube.com") || host == "youtu.be" || host == "www.youtu.be")
}

fn host_of(candidate: &str) -> Option<String> {
    let url = Url::parse(candidate).ok()?;
    url.host_str().map(str::to_ascii_lowercase)
}

/// Classify a bare link; anything that is not a tweet or a video is `None`.
pub fn detect_embed(candidate: &str) -> Option<Embed> {
    let url = candidate.trim();
    if url.is_empty() || url.contains(char::is_whitespace) {
        return None;
    }

    if is_twitter_url(url) {
        return tweet_embed_url(url).map(|embed_url| Embed::Tweet {
            url: url.to_string(),
            embed_url,
        });
    }
    if is_youtube_url(url) {
        return youtube_embed_url(url).map(|embed_url| Embed::Youtube {
            url: url.to_string(),
            embed_url,
        });
    }
    None
}

/// Embeds for every paragraph whose only content is a single link or URL.
pub fn embeds_in_markdown(markdown: &str) -> Vec<Embed> {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.autolink = true;
    let root = parse_document(&arena, markdown, &options);

    let mut embeds = Vec::new();
    collect_paragraph_embeds(root, &mut embeds);
    embeds
}

fn collect_paragraph_embeds<'a>(node: &'a AstNode<'a>, embeds: &mut Vec<Embed>) {
    let is_paragraph = matches!(node.data.borrow().value, NodeValue::Paragraph);
    if is_paragraph {
        if let Some(embed) = sole_link(node).as_deref().and_then(detect_embed) {
            embeds.push(embed);
        }
        return;
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        collect_paragraph_embeds(next, embeds);
        child = next.next_sibling();
    }
}

fn sole_link<'a>(paragraph: &'a AstNode<'a>) -> Option<String> {
    let only = paragraph.first_child()?;
    if only.next_sibling().is_some() {
        return None;
    }
    let data = only.data.borrow();
    match &data.value {
        NodeValue::Link(link) => Some(link.url.clone()),
        NodeValue::Text(text) => Some(text.trim().to_string()),
        _ => None,
    }
}
