//! Content maintenance toolkit for a headless-CMS blog.
//!
//! The text utilities ([`normalize_markdown`], [`extract_headings`],
//! [`derive_seo`]) are pure functions. Everything that touches the dataset
//! goes through [`application::repos::DocumentStore`].

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::headings::{Heading, HeadingLevel, HeadingSource, extract_headings};
pub use application::markdown::normalize_markdown;
pub use application::seo::{SeoFields, SeoInput, derive_seo};
