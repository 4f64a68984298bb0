use std::{
    path::Path,
    process,
    sync::Arc,
};

use inkpress::{
    application::{
        content::SiteContent,
        embeds::embeds_in_markdown,
        error::AppError,
        headings::{HeadingSource, extract_headings},
        markdown::{markdown_to_plain_text, normalize_markdown, portable_to_plain_text},
        migrations::{
            Migration, MigrationOptions, NormalizeBodyMarkdown, SyncPostSeo, run_migration,
        },
        reading_time::{
            calculate_reading_time, estimate_reading_time_words, format_reading_time,
        },
        repos::DocumentStore,
        seo::{SeoInput, derive_seo},
        sitemap::SitemapService,
        structured_data::{blog_posting_json_ld, breadcrumb_json_ld, post_breadcrumbs},
        syndication::SyndicationService,
    },
    config::{
        self, BatchArgs, Command, MigrateCommand, OutputArgs, ReadingTimeArgs, Settings,
        SourceArgs,
    },
    domain::{documents::PostView, portable::blocks_from_value},
    infra::{dataset::NdjsonDataset, error::InfraError, telemetry},
};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.report().chain();
    if dispatcher::has_been_set() {
        error!(error = %chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Command::Normalize(args) => {
            let markdown = read_input(args.file.as_deref()).await?;
            write_output(&args.output, &normalize_markdown(&markdown)).await
        }
        Command::Headings(args) => run_headings(&settings, args).await,
        Command::ReadingTime(args) => run_reading_time(&settings, args).await,
        Command::Embeds(args) => run_embeds(&settings, args).await,
        Command::Seo(args) => run_seo(&settings, &args.post).await,
        Command::JsonLd(args) => run_json_ld(&settings, &args.post.post, args.breadcrumbs).await,
        Command::Migrate(args) => match args.command {
            MigrateCommand::NormalizeBodyMarkdown(body) => {
                let migration = NormalizeBodyMarkdown::new(&body.types);
                run_migrate(&settings, &migration, &body.batch).await
            }
            MigrateCommand::SyncPostSeo(batch) => {
                run_migrate(&settings, &SyncPostSeo::default(), &batch).await
            }
        },
        Command::Sitemap(output) => {
            let service = SitemapService::new(open_store(&settings)?, settings.site.url.clone());
            let xml = service.sitemap_xml(OffsetDateTime::now_utc()).await?;
            write_output(&output, &xml).await
        }
        Command::Robots(output) => {
            let service = SitemapService::new(open_store(&settings)?, settings.site.url.clone());
            let robots = service.robots_txt().await?;
            write_output(&output, &robots).await
        }
        Command::Feed(args) => {
            let service =
                SyndicationService::new(open_store(&settings)?, settings.feed_options(args.limit));
            let rss = service.rss_feed(OffsetDateTime::now_utc()).await?;
            write_output(&args.output, &rss).await
        }
    }
}

async fn run_headings(settings: &Settings, args: SourceArgs) -> Result<(), AppError> {
    let headings = match args.post.as_deref() {
        Some(slug) => {
            let content = load_content(settings).await?;
            let post = find_post(&content, slug)?;
            match non_blank(post.body_markdown.as_deref()) {
                Some(markdown) => extract_headings(HeadingSource::Markdown(markdown)),
                None => {
                    let blocks = post
                        .body
                        .as_ref()
                        .map(blocks_from_value)
                        .unwrap_or_default();
                    extract_headings(HeadingSource::Blocks(&blocks))
                }
            }
        }
        None => {
            let markdown = read_input(args.file.as_deref()).await?;
            extract_headings(HeadingSource::Markdown(&markdown))
        }
    };
    print_json(&headings)
}

#[derive(Debug, Serialize)]
struct ReadingTimeOutput {
    minutes: u32,
    label: String,
}

async fn run_reading_time(settings: &Settings, args: ReadingTimeArgs) -> Result<(), AppError> {
    let text = match args.source.post.as_deref() {
        Some(slug) => {
            let content = load_content(settings).await?;
            post_plain_text(find_post(&content, slug)?)
        }
        None => markdown_to_plain_text(&read_input(args.source.file.as_deref()).await?),
    };

    let minutes = if args.words {
        estimate_reading_time_words(Some(&text), 1)
    } else {
        calculate_reading_time(Some(&text))
    };
    print_json(&ReadingTimeOutput {
        minutes,
        label: format_reading_time(minutes),
    })
}

async fn run_embeds(settings: &Settings, args: SourceArgs) -> Result<(), AppError> {
    let markdown = match args.post.as_deref() {
        Some(slug) => {
            let content = load_content(settings).await?;
            find_post(&content, slug)?
                .body_markdown
                .clone()
                .unwrap_or_default()
        }
        None => read_input(args.file.as_deref()).await?,
    };
    print_json(&embeds_in_markdown(&markdown))
}

async fn run_seo(settings: &Settings, slug: &str) -> Result<(), AppError> {
    let content = load_content(settings).await?;
    let post = find_post(&content, slug)?;
    let fields = derive_seo(SeoInput {
        title: post.title.as_deref(),
        excerpt: post.excerpt.as_deref(),
        body_markdown: post.body_markdown.as_deref(),
        body: post.body.as_ref(),
        cover_image: post.cover_image.as_ref(),
    });
    print_json(&fields)
}

async fn run_json_ld(settings: &Settings, slug: &str, breadcrumbs: bool) -> Result<(), AppError> {
    let content = load_content(settings).await?;
    let post = find_post(&content, slug)?;
    let site_url = content.site_url(settings.site.url.as_deref());

    let posting = blog_posting_json_ld(
        post,
        &content,
        site_url.as_deref(),
        settings.site.images.as_ref(),
    );
    if !breadcrumbs {
        return print_json(&posting);
    }

    let site_url = site_url.ok_or_else(|| {
        AppError::validation("breadcrumbs need a site URL (set `siteUrl` or --site-url)")
    })?;
    let trail = breadcrumb_json_ld(&post_breadcrumbs(post, &site_url));
    print_json(&[posting, trail])
}

async fn run_migrate(
    settings: &Settings,
    migration: &dyn Migration,
    batch: &BatchArgs,
) -> Result<(), AppError> {
    let store = open_store(settings)?;
    let options = MigrationOptions {
        apply: batch.apply,
        chunk_size: batch.chunk.unwrap_or(settings.migrations.chunk_size.get()),
    };

    let report = run_migration(store.as_ref(), migration, options).await?;
    for line in report.lines() {
        println!("{line}");
    }
    Ok(())
}

fn open_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>, AppError> {
    let path = settings.dataset.path.as_ref().ok_or_else(|| {
        InfraError::configuration(
            "dataset path is required (provide --dataset or set INKPRESS__DATASET__PATH)",
        )
    })?;
    Ok(Arc::new(NdjsonDataset::new(path)))
}

async fn load_content(settings: &Settings) -> Result<SiteContent, AppError> {
    let store = open_store(settings)?;
    Ok(SiteContent::load(store.as_ref()).await?)
}

fn find_post<'a>(content: &'a SiteContent, slug: &str) -> Result<&'a PostView, AppError> {
    content
        .post_by_slug(slug)
        .ok_or_else(|| AppError::not_found(format!("post `{slug}`")))
}

fn post_plain_text(post: &PostView) -> String {
    match non_blank(post.body_markdown.as_deref()) {
        Some(markdown) => markdown_to_plain_text(markdown),
        None => {
            let blocks = post
                .body
                .as_ref()
                .map(blocks_from_value)
                .unwrap_or_default();
            portable_to_plain_text(&blocks)
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

async fn read_input(file: Option<&Path>) -> Result<String, AppError> {
    match file {
        Some(path) => Ok(tokio::fs::read_to_string(path)
            .await
            .map_err(InfraError::from)?),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .map_err(InfraError::from)?;
            Ok(buffer)
        }
    }
}

async fn write_output(output: &OutputArgs, contents: &str) -> Result<(), AppError> {
    match output.out.as_ref() {
        Some(path) => write_file(path, contents).await,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(contents.as_bytes())
                .await
                .map_err(InfraError::from)?;
            stdout.flush().await.map_err(InfraError::from)?;
            Ok(())
        }
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(InfraError::from)?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(InfraError::from)?;
    info!(
        target = "inkpress::cli",
        path = %path.display(),
        bytes = contents.len(),
        "output written"
    );
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
