//! outline-sync - personal content as Markdown outlines
//!
//! Collects bookmarks, archived articles and published feed posts from their
//! services, normalizes them and renders Markdown documents for a Logseq
//! graph stored in Nextcloud.
//!
//! # Architecture
//!
//! Every run is a single pass:
//! - Collectors fetch from a service, or serve a fresh on-disk cache
//! - Records are normalized into typed domain structs
//! - Bookmarks are rebuilt into a folder tree and rendered as an outline
//! - Records from all sources are bucketed by date and time for the stream
//! - The document is uploaded over WebDAV (or written locally in debug runs)
//!
//! # Modules
//!
//! - `adapters`: Remote services (bookmarks, wallabag, feed, WebDAV)
//! - `cache`: Timestamped JSON cache with a staleness check
//! - `core`: Folder tree, renderers, stream merge, templates, publishing
//! - `domain`: Data structures (Bookmark, Folder, Article, FeedEntry)
//! - `config`: Config file and environment
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Upload Bookmarks.md
//! outline-sync bookmarks
//!
//! # Rebuild the stream from the services and write it locally
//! outline-sync stream --debug
//! ```

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{ArchiveCollector, BookmarkCollector, Collector, FeedCollector, WebDavPublisher};
pub use cache::{CacheFile, CacheStore};
pub use config::{Config, ConfigError};
pub use crate::core::{FolderTree, RenderError, StreamMerger, TreeRenderer};
pub use domain::{Article, Bookmark, FeedEntry, Folder};
