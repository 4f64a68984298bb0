//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::migrations::DEFAULT_CHUNK_SIZE;
use crate::application::syndication::FeedOptions;
use crate::domain::image::ImageCdn;

pub use cli::*;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inkpress";
const ENV_PREFIX: &str = "INKPRESS";
const DEFAULT_LANGUAGE: &str = "ja";
const DEFAULT_IMAGE_DATASET: &str = "production";
const DEFAULT_FEED_LIMIT: usize = 20;
const DEFAULT_FEED_TITLE: &str = "Blog";
const DEFAULT_FEED_DESCRIPTION: &str = "Latest posts";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub dataset: DatasetSettings,
    pub site: SiteSettings,
    pub migrations: MigrationSettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatasetSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Fallback when the `siteSettings` document has no `siteUrl`.
    pub url: Option<String>,
    pub language: String,
    /// Image CDN coordinates; absent when no project id is configured.
    pub images: Option<ImageCdn>,
}

#[derive(Debug, Clone)]
pub struct MigrationSettings {
    pub chunk_size: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub limit: NonZeroUsize,
    pub title: String,
    pub description: String,
}

impl Settings {
    /// Channel options for the RSS feed, honouring a per-run limit override.
    pub fn feed_options(&self, limit: Option<usize>) -> FeedOptions {
        FeedOptions {
            site_url: self.site.url.clone(),
            language: self.site.language.clone(),
            limit: limit.unwrap_or(self.feed.limit.get()).max(1),
            default_title: self.feed.title.clone(),
            default_description: self.feed.description.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    dataset: RawDatasetSettings,
    site: RawSiteSettings,
    migrations: RawMigrationSettings,
    feed: RawFeedSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(path) = overrides.dataset.as_ref() {
            self.dataset.path = Some(path.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            dataset,
            site,
            migrations,
            feed,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            dataset: build_dataset_settings(dataset),
            site: build_site_settings(site)?,
            migrations: build_migration_settings(migrations)?,
            feed: build_feed_settings(feed)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_dataset_settings(dataset: RawDatasetSettings) -> DatasetSettings {
    let path = dataset
        .path
        .filter(|path| !path.as_os_str().is_empty());
    DatasetSettings { path }
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let url = non_blank(site.url);
    if let Some(url) = url.as_deref() {
        url::Url::parse(url)
            .map_err(|err| LoadError::invalid("site.url", format!("invalid URL `{url}`: {err}")))?;
    }

    let language = non_blank(site.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let images = non_blank(site.project_id).map(|project_id| ImageCdn {
        project_id,
        dataset: non_blank(site.dataset).unwrap_or_else(|| DEFAULT_IMAGE_DATASET.to_string()),
    });

    Ok(SiteSettings {
        url,
        language,
        images,
    })
}

fn build_migration_settings(
    migrations: RawMigrationSettings,
) -> Result<MigrationSettings, LoadError> {
    let chunk_size = non_zero_usize(
        migrations.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        "migrations.chunk_size",
    )?;
    Ok(MigrationSettings { chunk_size })
}

fn build_feed_settings(feed: RawFeedSettings) -> Result<FeedSettings, LoadError> {
    let limit = non_zero_usize(feed.limit.unwrap_or(DEFAULT_FEED_LIMIT), "feed.limit")?;
    Ok(FeedSettings {
        limit,
        title: non_blank(feed.title).unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string()),
        description: non_blank(feed.description)
            .unwrap_or_else(|| DEFAULT_FEED_DESCRIPTION.to_string()),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatasetSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    url: Option<String>,
    language: Option<String>,
    project_id: Option<String>,
    dataset: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMigrationSettings {
    chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    limit: Option<usize>,
    title: Option<String>,
    description: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_usize(value: usize, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
