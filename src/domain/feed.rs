//! Entries published in an RSS or Atom feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedEntry {
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Last modification (or publication) time
    pub modified_at: DateTime<Utc>,

    /// Author names
    #[serde(default)]
    pub authors: Vec<String>,

    /// Link to the published page
    pub link: String,

    #[serde(default)]
    pub content: String,
}
