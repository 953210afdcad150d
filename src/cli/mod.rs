//! Command-line interface for outline-sync.
//!
//! One subcommand per document. Each run collects its sources, renders the
//! document and publishes it, either over WebDAV or (with `--debug`) to the
//! local output directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adapters::webdav::WebDavPublisher;
use crate::adapters::{ArchiveCollector, BookmarkCollector, Collector, FeedCollector};
use crate::config::{Config, CONFIG_ENV};
use crate::core::{
    ArticleListRenderer, ArticleTemplates, Destination, FolderTree, OutlineTemplates, StreamMerger,
    StreamRenderer, StreamTemplates, TreeRenderer,
};

/// Document file names in the upload folder
pub const BOOKMARKS_FILE: &str = "Bookmarks.md";
pub const ARTICLES_FILE: &str = "Articles.md";
pub const STREAM_FILE: &str = "Stream.md";

/// outline-sync - bookmarks, archived articles and feed posts as Markdown outlines
#[derive(Parser, Debug)]
#[command(name = "outline-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Skip the cache and write documents to the output directory instead of uploading
    #[arg(long, global = true)]
    pub debug: bool,

    /// Skip the cache
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Build Bookmarks.md from the bookmark folder tree
    Bookmarks,

    /// Build Articles.md from the read-it-later archive
    Articles,

    /// Build Stream.md from every source, newest first
    Stream,

    /// Show resolved configuration
    Config,
}

/// How a single run treats the cache and the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub force_refresh: bool,
    pub local: bool,
}

impl Cli {
    /// Run options derived from the global flags
    pub fn options(&self) -> RunOptions {
        RunOptions {
            force_refresh: self.debug || self.refresh,
            local: self.debug,
        }
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;
        let options = self.options();

        match self.command {
            Commands::Bookmarks => {
                let destination = destination(&config, options)?;
                let document = bookmarks_document(&config, options).await?;
                publish(&destination, BOOKMARKS_FILE, &document).await
            }
            Commands::Articles => {
                let destination = destination(&config, options)?;
                let document = articles_document(&config, options).await?;
                publish(&destination, ARTICLES_FILE, &document).await
            }
            Commands::Stream => {
                let destination = destination(&config, options)?;
                let document = stream_document(&config, options).await?;
                publish(&destination, STREAM_FILE, &document).await
            }
            Commands::Config => {
                show_config(&config);
                Ok(())
            }
        }
    }
}

/// Pick the output for this run. Checked before anything is collected.
pub fn destination(config: &Config, options: RunOptions) -> Result<Destination> {
    if options.local {
        return Ok(Destination::Local(config.output_dir.clone()));
    }

    let publisher = WebDavPublisher::new(config.webdav_settings()?, &config.http)?;
    Ok(Destination::Remote(publisher))
}

async fn publish(destination: &Destination, file: &str, document: &str) -> Result<()> {
    let location = destination
        .publish(file, document)
        .await
        .with_context(|| format!("Failed to publish {}", file))?;

    println!("{} -> {}", file, location);
    Ok(())
}

// ============================================================================
// Documents
// ============================================================================

fn bookmark_collector(config: &Config) -> Result<BookmarkCollector> {
    Ok(BookmarkCollector::new(
        config.bookmark_settings()?,
        &config.http,
        config.cache_store().file("bookmarks"),
        config.timezone,
    )?)
}

fn archive_collector(config: &Config) -> Result<ArchiveCollector> {
    Ok(ArchiveCollector::new(
        config.archive_settings()?,
        &config.http,
        config.cache_store().file("wallabag"),
        config.timezone,
    )?)
}

/// Collect bookmarks and render the folder outline
pub async fn bookmarks_document(config: &Config, options: RunOptions) -> Result<String> {
    let collector = bookmark_collector(config)?;
    let templates = OutlineTemplates::load(config.templates_dir.as_deref()).await?;

    let folders = collector.collect(options.force_refresh).await?;
    let tree = FolderTree::new(folders, &config.ignored_parent_ids);
    info!(folders = tree.len(), bookmarks = tree.bookmark_count(), "Rendering bookmarks");

    let renderer = TreeRenderer::new(templates, config.date_style());
    Ok(renderer.render_document(&tree)?)
}

/// Collect archived articles and render them as a list
pub async fn articles_document(config: &Config, options: RunOptions) -> Result<String> {
    let collector = archive_collector(config)?;
    let templates = ArticleTemplates::load(config.templates_dir.as_deref()).await?;

    let articles = collector.collect(options.force_refresh).await?;
    info!(articles = articles.len(), "Rendering articles");

    let renderer = ArticleListRenderer::new(templates, config.date_style());
    Ok(renderer.render_document(&articles))
}

/// Collect every source and render the merged stream
pub async fn stream_document(config: &Config, options: RunOptions) -> Result<String> {
    // All settings are checked before the first request
    let feed = FeedCollector::new(config.feed_url()?, &config.http)?;
    let bookmarks = bookmark_collector(config)?;
    let archive = archive_collector(config)?;
    let templates = StreamTemplates::load(config.templates_dir.as_deref()).await?;

    let mut merger = StreamMerger::new(config.date_style());
    merger.add_feed_entries(feed.collect(options.force_refresh).await?);
    merger.add_folders(&bookmarks.collect(options.force_refresh).await?);
    merger.add_articles(archive.collect(options.force_refresh).await?);
    info!(
        entries = merger.len(),
        days = merger.date_count(),
        "Collected stream entries"
    );

    let renderer = StreamRenderer::new(templates, config.date_style());
    Ok(renderer.render_document(&merger.into_buckets())?)
}

// ============================================================================
// Config
// ============================================================================

fn show_config(config: &Config) {
    let config_file = config
        .config_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none - using environment and defaults)".to_string());
    let templates = config
        .templates_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(built-in)".to_string());

    println!("Config file: {}", config_file);
    println!();
    println!("Paths:");
    println!("  Cache:     {}", config.cache_dir.display());
    println!("  Output:    {}", config.output_dir.display());
    println!("  Templates: {}", templates);
    println!();
    println!("Nextcloud:");
    println!("  Host:       {}", shown(&config.nextcloud.host));
    println!("  Username:   {}", shown(&config.nextcloud.username));
    println!("  Password:   {}", masked(&config.nextcloud.password));
    println!("  Upload dir: {}", shown(&config.nextcloud.upload_dir));
    println!("  Ignored parent folders: {:?}", config.ignored_parent_ids);
    println!();
    println!("Wallabag:");
    println!("  Host:          {}", shown(&config.wallabag.host));
    println!("  Client ID:     {}", shown(&config.wallabag.client_id));
    println!("  Client secret: {}", masked(&config.wallabag.client_secret));
    println!("  Username:      {}", shown(&config.wallabag.username));
    println!("  Password:      {}", masked(&config.wallabag.password));
    println!();
    println!("Feed: {}", shown(&config.feed_url));
    println!();
    println!("Stream:");
    println!("  Timezone:    {}", config.timezone.name());
    println!("  Date format: {}", config.date_format);
    println!();
    println!("HTTP timeouts:");
    println!("  Connect: {}s", config.http.connect_timeout.as_secs());
    println!("  Request: {}s", config.http.request_timeout.as_secs());
}

fn shown(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "(not set)".to_string())
}

fn masked(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => "********".to_string(),
        _ => "(not set)".to_string(),
    }
}
