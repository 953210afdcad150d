//! Bookmarks and the folders that hold them.
//!
//! The bookmark service exposes folders as a nested tree while bookmarks only
//! reference folders by id. `FolderNode` is the nested shape as it arrives;
//! `Folder` is the flattened, normalized shape that gets cached and rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resolved parent id of every root-level folder
pub const ROOT_FOLDER_ID: i64 = 0;

/// Synthetic folder for bookmarks that list no folder at all
pub const UNFILED_FOLDER_ID: i64 = -1;

/// Title used when a remote folder has a blank title
pub const UNTITLED_FOLDER: &str = "(no title)";

/// Title of placeholder folders created for unknown folder ids
pub const PLACEHOLDER_FOLDER: &str = "(empty)";

/// A single saved bookmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bookmark {
    /// Title as saved
    pub title: String,

    /// Target URL
    pub url: String,

    /// When the bookmark was added
    pub added_at: DateTime<Utc>,
}

impl Bookmark {
    /// Create a new bookmark
    pub fn new(title: impl Into<String>, url: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            added_at,
        }
    }
}

/// A folder with its own bookmarks, flattened out of the remote tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Folder {
    /// Folder id, unique within a collection
    pub id: i64,

    /// Human-readable title
    pub title: String,

    /// Literal parent id as reported by the service
    pub parent_id: i64,

    /// Bookmarks filed directly in this folder, in arrival order
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl Folder {
    /// Create an empty folder
    pub fn new(id: i64, title: impl Into<String>, parent_id: i64) -> Self {
        Self {
            id,
            title: title.into(),
            parent_id,
            bookmarks: Vec::new(),
        }
    }

    /// Placeholder for a folder id that the folder listing never mentioned
    pub fn placeholder(id: i64) -> Self {
        Self::new(id, PLACEHOLDER_FOLDER, ROOT_FOLDER_ID)
    }

    /// Add a bookmark
    pub fn with_bookmark(mut self, bookmark: Bookmark) -> Self {
        self.bookmarks.push(bookmark);
        self
    }
}

/// A folder as the bookmark service returns it: already nested
#[derive(Debug, Clone, Deserialize)]
pub struct FolderNode {
    pub id: i64,

    #[serde(default)]
    pub title: String,

    /// Only meaningful for top-level nodes; nested nodes take their parent
    /// from the nesting itself.
    #[serde(default, rename = "parent_folder")]
    pub parent_id: Option<i64>,

    #[serde(default)]
    pub children: Vec<FolderNode>,
}

/// A bookmark together with the id of the folder it was filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiledBookmark {
    pub folder_id: i64,
    pub bookmark: Bookmark,
}
