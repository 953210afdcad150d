//! Core document logic.
//!
//! This module contains:
//! - FolderTree: folder reconciliation and parent resolution
//! - TreeRenderer: recursive outline of the folder tree
//! - StreamMerger / StreamRenderer: date and time bucketed merge of all sources
//! - ArticleListRenderer: the archived-articles document
//! - Template: `{placeholder}` substitution with file overrides
//! - Destination: WebDAV or local output

pub mod articles;
pub mod folder_tree;
pub mod publish;
pub mod renderer;
pub mod stream;
pub mod template;

// Re-export commonly used types
pub use articles::{ArticleListRenderer, ArticleTemplates};
pub use folder_tree::{assemble, FolderTree};
pub use publish::{Destination, PublishError};
pub use renderer::{OutlineTemplates, RenderError, TreeRenderer};
pub use stream::{DateBucket, EntryKind, StreamEntry, StreamMerger, StreamRenderer, StreamTemplates, TimeSlot};
pub use template::{DateStyle, Template, DEFAULT_DATE_FORMAT};
