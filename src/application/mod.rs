//! Application services layer.

pub mod content;
pub mod embeds;
pub mod error;
pub mod headings;
pub mod markdown;
pub mod migrations;
pub mod reading_time;
pub mod repos;
pub mod seo;
pub mod sitemap;
pub mod structured_data;
pub mod syndication;
