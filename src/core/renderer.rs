//! Recursive Markdown outline for the folder tree.
//!
//! Output shape, one tab per level:
//!
//! ```text
//! - **Tech**
//! 	- **Rust**
//! 		- [Book](https://doc.rust-lang.org/book/) (doc.rust-lang.org)
//! 	- [Hacker News](https://news.ycombinator.com/) (news.ycombinator.com)
//! ```
//!
//! A folder's child folders come before its own bookmarks.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::adapters::display_host;
use crate::domain::{Bookmark, Folder, ROOT_FOLDER_ID};

use super::folder_tree::FolderTree;
use super::template::{indent, load_or_default, DateStyle, Template};

/// Errors raised while turning collected records into Markdown
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Folder {folder_id} is its own ancestor")]
    Cycle { folder_id: i64 },

    #[error("Folders {folder_ids:?} cannot be reached from the root (parent cycle)")]
    Unreachable { folder_ids: Vec<i64> },

    #[error("No template for entry type '{0}'")]
    UnrecognizedType(String),
}

/// Templates for the bookmarks document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineTemplates {
    /// Document preamble
    pub header: Template,

    /// Folder heading, takes `{title}`
    pub folder: Template,

    /// One bookmark, takes `{title}`, `{url}`, `{host}` and `{added}`
    pub bookmark: Template,
}

impl OutlineTemplates {
    pub const HEADER: &'static str = "public:: true";
    pub const FOLDER: &'static str = "- **{title}**";
    pub const BOOKMARK: &'static str = "- [{title}]({url}) ({host})";

    /// Load overrides from `dir` (`bookmarks.md`, `bookmarks-folder.md`,
    /// `bookmarks-bookmark.md`), falling back to the defaults
    pub async fn load(dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            header: load_or_default(dir, "bookmarks.md", Self::HEADER).await?,
            folder: load_or_default(dir, "bookmarks-folder.md", Self::FOLDER).await?,
            bookmark: load_or_default(dir, "bookmarks-bookmark.md", Self::BOOKMARK).await?,
        })
    }
}

impl Default for OutlineTemplates {
    fn default() -> Self {
        Self {
            header: Template::new(Self::HEADER),
            folder: Template::new(Self::FOLDER),
            bookmark: Template::new(Self::BOOKMARK),
        }
    }
}

/// Renders a `FolderTree` as an indented outline
#[derive(Debug, Clone, Default)]
pub struct TreeRenderer {
    templates: OutlineTemplates,
    dates: DateStyle,
}

impl TreeRenderer {
    /// Create a renderer
    pub fn new(templates: OutlineTemplates, dates: DateStyle) -> Self {
        Self { templates, dates }
    }

    /// Header followed by the full outline
    pub fn render_document(&self, tree: &FolderTree) -> Result<String, RenderError> {
        let mut document = self.templates.header.render(&[]).trim().to_string();
        document.push('\n');
        document.push_str(&self.render(tree)?);
        Ok(document)
    }

    /// Render every folder from the root down.
    ///
    /// Fails when a folder would be visited twice or when some folders cannot
    /// be reached from the root at all.
    pub fn render(&self, tree: &FolderTree) -> Result<String, RenderError> {
        let mut out = String::new();
        let mut visited = HashSet::new();
        self.render_level(tree, 0, ROOT_FOLDER_ID, &mut out, &mut visited)?;

        if visited.len() < tree.len() {
            let mut folder_ids: Vec<i64> = tree.ids().filter(|id| !visited.contains(id)).collect();
            folder_ids.sort_unstable();
            return Err(RenderError::Unreachable { folder_ids });
        }

        debug!(
            folders = visited.len(),
            bookmarks = tree.bookmark_count(),
            "Rendered folder tree"
        );
        Ok(out)
    }

    /// Render the folders placed under `expected_parent`, starting at `level`
    pub fn render_subtree(
        &self,
        tree: &FolderTree,
        level: usize,
        expected_parent: i64,
    ) -> Result<String, RenderError> {
        let mut out = String::new();
        let mut visited = HashSet::new();
        self.render_level(tree, level, expected_parent, &mut out, &mut visited)?;
        Ok(out)
    }

    fn render_level(
        &self,
        tree: &FolderTree,
        level: usize,
        expected_parent: i64,
        out: &mut String,
        visited: &mut HashSet<i64>,
    ) -> Result<(), RenderError> {
        for folder in tree.children(expected_parent) {
            if !visited.insert(folder.id) {
                return Err(RenderError::Cycle { folder_id: folder.id });
            }

            self.push_line(out, &self.folder_heading(folder), level);
            self.render_level(tree, level + 1, folder.id, out, visited)?;

            for bookmark in &folder.bookmarks {
                self.push_line(out, &self.bookmark_line(bookmark), level + 1);
            }
        }

        Ok(())
    }

    fn folder_heading(&self, folder: &Folder) -> String {
        self.templates.folder.render(&[("title", folder.title.as_str())])
    }

    /// One bookmark through the bookmark template, unindented
    pub fn bookmark_line(&self, bookmark: &Bookmark) -> String {
        let host = display_host(&bookmark.url);
        let added = self.dates.format(bookmark.added_at);
        self.templates.bookmark.render(&[
            ("title", bookmark.title.as_str()),
            ("url", bookmark.url.as_str()),
            ("host", host.as_str()),
            ("added", added.as_str()),
        ])
    }

    fn push_line(&self, out: &mut String, text: &str, level: usize) {
        out.push_str(&indent(text, level));
        out.push('\n');
    }
}
