//! Domain types for outline-sync.
//!
//! Every source is normalized into one of these records before it is cached,
//! merged or rendered:
//! - Bookmark / Folder: the bookmark service
//! - Article: the read-it-later archive
//! - FeedEntry: the published-articles feed

pub mod article;
pub mod bookmark;
pub mod feed;
pub mod timestamp;

// Re-export commonly used types
pub use article::{Annotation, Article};
pub use bookmark::{
    Bookmark, FiledBookmark, Folder, FolderNode, PLACEHOLDER_FOLDER, ROOT_FOLDER_ID,
    UNFILED_FOLDER_ID, UNTITLED_FOLDER,
};
pub use feed::FeedEntry;
pub use timestamp::{parse_timestamp, parse_zone, TimestampError, DEFAULT_TIMEZONE};
