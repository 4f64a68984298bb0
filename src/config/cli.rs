use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the inkpress binary.
#[derive(Debug, Parser)]
#[command(
    name = "inkpress",
    version,
    about = "Markdown, SEO and feed tooling for a CMS blog dataset"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "INKPRESS_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the NDJSON dataset path.
    #[arg(
        long = "dataset",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub dataset: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the public site URL used when site settings carry none.
    #[arg(long = "site-url", value_name = "URL", global = true)]
    pub site_url: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Normalize emphasis and heading markers in a markdown file (or stdin).
    Normalize(NormalizeArgs),
    /// Print the table of contents of a markdown file, stdin, or a post as JSON.
    Headings(SourceArgs),
    /// Print the reading-time estimate of a markdown file, stdin, or a post.
    #[command(name = "reading-time")]
    ReadingTime(ReadingTimeArgs),
    /// List the YouTube and X/Twitter embeds found in bare-link paragraphs.
    Embeds(SourceArgs),
    /// Print the SEO fields derived for one post as JSON.
    Seo(PostArgs),
    /// Print schema.org JSON-LD for one post.
    #[command(name = "json-ld")]
    JsonLd(JsonLdArgs),
    /// Batch content migrations (dry-run unless --apply).
    Migrate(MigrateArgs),
    /// Generate sitemap.xml.
    Sitemap(OutputArgs),
    /// Generate robots.txt.
    Robots(OutputArgs),
    /// Generate the RSS 2.0 feed.
    Feed(FeedArgs),
}

#[derive(Debug, Args, Clone)]
pub struct NormalizeArgs {
    /// Markdown file to read; stdin when omitted.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Markdown file to read; stdin when neither FILE nor --post is given.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath, conflicts_with = "post")]
    pub file: Option<PathBuf>,

    /// Read the body of the post with this slug from the dataset.
    #[arg(long = "post", value_name = "SLUG")]
    pub post: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReadingTimeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Estimate from whitespace-separated words instead of characters.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub words: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PostArgs {
    /// Slug of the post.
    #[arg(long = "post", value_name = "SLUG")]
    pub post: String,
}

#[derive(Debug, Args, Clone)]
pub struct JsonLdArgs {
    #[command(flatten)]
    pub post: PostArgs,

    /// Emit the BreadcrumbList alongside the BlogPosting.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub breadcrumbs: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct OutputArgs {
    /// Write to this file instead of stdout.
    #[arg(long = "out", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FeedArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    /// Override the number of posts in the feed.
    #[arg(long = "limit", value_name = "COUNT")]
    pub limit: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum MigrateCommand {
    /// Normalize `bodyMarkdown` emphasis and heading markers.
    #[command(name = "normalize-body-markdown")]
    NormalizeBodyMarkdown(NormalizeBodyArgs),
    /// Fill `seo` title, description and og image from post content.
    #[command(name = "sync-post-seo")]
    SyncPostSeo(BatchArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct BatchArgs {
    /// Commit the planned patches; without it the run is a dry run.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub apply: bool,

    /// Patches per commit (minimum 1).
    #[arg(long = "chunk", value_name = "COUNT")]
    pub chunk: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct NormalizeBodyArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Comma-separated document types to scan.
    #[arg(long = "types", value_name = "TYPES", value_delimiter = ',', default_value = "post")]
    pub types: Vec<String>,
}
